mod common;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

use common::{TestWorkspace, fixture_path};
use exp_search::resolve::RoleMapping;

fn exp_search() -> Command {
    Command::cargo_bin("exp-search").expect("binary exists")
}

#[test]
fn resolve_prints_the_role_to_column_table() {
    exp_search()
        .args([
            "resolve",
            "-i",
            fixture_path("experiencias.csv").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(
            contains("identifier")
                .and(contains("ID_Experiencia"))
                .and(contains("monetary_value"))
                .and(contains("Valor COP"))
                .and(contains("unit_value"))
                .and(contains("Valor_SMMLV"))
                .and(contains("classification_codes"))
                .and(contains("Codigos_UNSPSC")),
        );
}

#[test]
fn resolve_saves_a_mapping_that_round_trips_through_json() {
    let workspace = TestWorkspace::new();
    let mapping_path = workspace.path().join("mapping.json");
    exp_search()
        .args([
            "resolve",
            "-i",
            fixture_path("experiencias.csv").to_str().unwrap(),
            "-m",
            mapping_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let mapping = RoleMapping::load(&mapping_path).expect("load saved mapping");
    assert_eq!(mapping.identifier, "ID_Experiencia");
    assert_eq!(mapping.sequence_number, "Consecutivo");
    assert_eq!(mapping.counterparty_name, "Contratante");
    assert_eq!(mapping.description, "Objeto");
    assert_eq!(mapping.monetary_value, "Valor COP");
    assert_eq!(mapping.unit_value, "Valor_SMMLV");
    assert_eq!(mapping.classification_codes, "Codigos_UNSPSC");

    let saved_again = workspace.path().join("mapping2.json");
    mapping.save(&saved_again).expect("save mapping");
    assert_eq!(mapping, RoleMapping::load(&saved_again).expect("reload"));
}

#[test]
fn unresolved_roles_are_reported_by_name() {
    let workspace = TestWorkspace::new();
    let input = workspace.write(
        "renamed.csv",
        "id;consecutivo;contratante;objeto;columna_a;columna_b;columna_c\n\
         1;001;ALCALDIA;SUMINISTRO;111,31;144.703.000;11101500\n",
    );
    exp_search()
        .args(["resolve", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(
            contains("monetary_value")
                .and(contains("unit_value"))
                .and(contains("classification_codes")),
        );
}

#[test]
fn positional_fallback_accepts_keywordless_headers() {
    let workspace = TestWorkspace::new();
    let contents = "c0;c1;c2;c3;c4;c5;c6;c7;c8;c9\n\
                    1;001;X;Y;ALCALDIA;SUMINISTRO;111,31;144.703.000;1;11101500\n";
    let input = workspace.write("anonymous.csv", contents);

    exp_search()
        .args(["resolve", "-i", input.to_str().unwrap()])
        .assert()
        .failure();

    exp_search()
        .args([
            "resolve",
            "-i",
            input.to_str().unwrap(),
            "--positional-fallback",
        ])
        .assert()
        .success()
        .stdout(contains("counterparty_name").and(contains("c4")));
}

#[test]
fn unreadable_file_in_any_combination_is_a_no_table_outcome() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("single_column.csv", "solo\nuno\ndos\n");
    exp_search()
        .args(["resolve", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("at least 2 columns"));
}
