use plantao_types::{MergePolicy, TableKind};

#[test]
fn merge_order_starts_with_base_and_ends_with_cirurgias() {
    let order = TableKind::MERGE_ORDER;
    assert_eq!(order.first(), Some(&TableKind::Atendimentos));
    assert_eq!(order.last(), Some(&TableKind::Cirurgias));
    assert_eq!(order.len(), 4);
}

#[test]
fn key_columns_are_subsets_of_payload_columns() {
    for kind in TableKind::MERGE_ORDER {
        for key_col in kind.key_columns() {
            assert!(
                kind.payload_columns().contains(key_col),
                "{kind}: key column {key_col} missing from payload"
            );
        }
    }
}

#[test]
fn catalogs_overwrite_only_ativo_and_ordem() {
    for kind in [TableKind::ProcedimentoTipos, TableKind::CirurgiaSituacoes] {
        match kind.policy() {
            MergePolicy::FieldOverwrite { fields } => {
                assert_eq!(fields, &["ativo", "ordem"]);
            }
            MergePolicy::LastWriteWins { .. } => panic!("catalogs are not LWW"),
        }
    }
}

#[test]
fn atendimentos_overwrite_fields_exclude_key_columns() {
    let MergePolicy::FieldOverwrite { fields } = TableKind::Atendimentos.policy() else {
        panic!("attendance table is field-overwrite");
    };
    for field in fields {
        assert!(!TableKind::Atendimentos.key_columns().contains(field));
    }
}

#[test]
fn cirurgias_policy_is_lww_on_updated_at() {
    match TableKind::Cirurgias.policy() {
        MergePolicy::LastWriteWins { updated, created } => {
            assert_eq!(updated, "updated_at");
            assert_eq!(created, "created_at");
        }
        MergePolicy::FieldOverwrite { .. } => panic!("cirurgias must be LWW"),
    }
}

#[test]
fn table_names_match_schema() {
    assert_eq!(
        TableKind::Atendimentos.table_name(),
        "pacientes_unicos_por_dia_prestador"
    );
    assert_eq!(TableKind::Cirurgias.table_name(), "cirurgias");
    assert_eq!(format!("{}", TableKind::ProcedimentoTipos), "procedimento_tipos");
}
