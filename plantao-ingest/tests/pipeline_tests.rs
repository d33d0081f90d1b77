use plantao_ingest::{
    MostFrequentLongestFirst, RawCaso, fold_accents, inherit_block_context, normalize_census,
    parse_report,
};
use pretty_assertions::assert_eq;

fn caso(row_idx: usize) -> RawCaso {
    RawCaso {
        data: Some("05/03/2024".to_string()),
        row_idx,
        ..Default::default()
    }
}

// ── fold_accents ────────────────────────────────────────────────

#[test]
fn folds_portuguese_accents() {
    assert_eq!(fold_accents("DR JOÃO GONÇALVES"), "DR JOAO GONCALVES");
    assert_eq!(fold_accents("Convênio Saúde"), "Convenio Saude");
    assert_eq!(fold_accents("sem acentos"), "sem acentos");
}

// ── inherit_block_context ───────────────────────────────────────

#[test]
fn continuation_rows_inherit_admission_data_once_per_prestador() {
    let mut rows = vec![
        RawCaso {
            atendimento: Some("1234567".to_string()),
            paciente: Some("MARIA".to_string()),
            aviso: Some("4321".to_string()),
            prestador: Some("DR JOAO".to_string()),
            ..caso(0)
        },
        RawCaso {
            prestador: Some("DR PEDRO".to_string()),
            ..caso(1)
        },
        // Same prestador again inside the same block: must NOT inherit.
        RawCaso {
            prestador: Some("DR PEDRO".to_string()),
            ..caso(2)
        },
    ];
    inherit_block_context(&mut rows);

    assert_eq!(rows[1].atendimento.as_deref(), Some("1234567"));
    assert_eq!(rows[1].paciente.as_deref(), Some("MARIA"));
    assert_eq!(rows[1].aviso.as_deref(), Some("4321"));
    assert_eq!(rows[2].atendimento, None);
}

#[test]
fn a_new_block_resets_the_prestador_set() {
    let mut rows = vec![
        RawCaso {
            atendimento: Some("1111111".to_string()),
            prestador: Some("DR JOAO".to_string()),
            ..caso(0)
        },
        RawCaso {
            prestador: Some("DR PEDRO".to_string()),
            ..caso(1)
        },
        // New block (different atendimento): DR PEDRO may inherit again.
        RawCaso {
            atendimento: Some("2222222".to_string()),
            prestador: Some("DR JOAO".to_string()),
            ..caso(2)
        },
        RawCaso {
            prestador: Some("DR PEDRO".to_string()),
            ..caso(3)
        },
    ];
    inherit_block_context(&mut rows);

    assert_eq!(rows[1].atendimento.as_deref(), Some("1111111"));
    assert_eq!(rows[3].atendimento.as_deref(), Some("2222222"));
}

#[test]
fn missing_dates_are_filled_from_neighbors() {
    let mut rows = vec![
        RawCaso {
            data: None,
            atendimento: Some("1111111".to_string()),
            prestador: Some("DR JOAO".to_string()),
            row_idx: 0,
            ..Default::default()
        },
        RawCaso {
            atendimento: Some("2222222".to_string()),
            prestador: Some("DR JOAO".to_string()),
            ..caso(1)
        },
    ];
    inherit_block_context(&mut rows);
    assert_eq!(rows[0].data.as_deref(), Some("05/03/2024"));
}

// ── normalize_census end-to-end ─────────────────────────────────

const RELATORIO: &str = "\
Data de Realização: 05/03/2024
Centro Cirúrgico,CENTRO CIRURGICO
Hora,Atendimento,Paciente,Aviso,Convênio,Prestador
1234567,MARIA DA SILVA,4321,08:00,09:30,HERNIORRAFIA UMBILICAL,UNIMED,DR JOÃO,DR ANEST,GERAL,101
SEGUNDO TEMPO,UNIMED,DR PEDRO,DR ANEST,GERAL,101
7654321,JOSE SANTOS,5555,10:00,11:00,COLECISTECTOMIA,BRADESCO,DR JOÃO,DR ANEST,GERAL,203
";

#[test]
fn census_end_to_end() {
    let rows = parse_report(RELATORIO);
    let prestadores = vec!["DR JOAO".to_string(), "DR PEDRO".to_string()];
    let saida = normalize_census(rows, "HSL", &prestadores, &MostFrequentLongestFirst);

    assert_eq!(saida.len(), 3);
    for row in &saida {
        assert_eq!(row.hospital, "HSL");
        assert_eq!((row.ano, row.mes, row.dia), (2024, 3, 5));
    }

    // The continuation row inherited MARIA's admission under DR PEDRO.
    let pedro = saida.iter().find(|r| r.prestador == "DR PEDRO").unwrap();
    assert_eq!(pedro.atendimento, "1234567");
    assert_eq!(pedro.aviso, "4321");

    // Accent-folded prestador matching kept "DR JOÃO" rows.
    assert_eq!(
        saida.iter().filter(|r| r.prestador == "DR JOÃO").count(),
        2
    );
}

#[test]
fn prestador_filter_drops_other_providers() {
    let rows = parse_report(RELATORIO);
    let somente_pedro = vec!["dr pedro".to_string()];
    let saida = normalize_census(rows, "HSL", &somente_pedro, &MostFrequentLongestFirst);
    assert_eq!(saida.len(), 1);
    assert_eq!(saida[0].prestador, "DR PEDRO");
}

#[test]
fn empty_prestador_list_keeps_everyone() {
    let rows = parse_report(RELATORIO);
    let saida = normalize_census(rows, "HSL", &[], &MostFrequentLongestFirst);
    assert_eq!(saida.len(), 3);
}

#[test]
fn duplicate_admissions_for_one_prestador_collapse_to_first() {
    let rows = vec![
        RawCaso {
            atendimento: Some("1234567".to_string()),
            paciente: Some("MARIA".to_string()),
            aviso: Some("4321".to_string()),
            prestador: Some("DR JOAO".to_string()),
            quarto: Some("101".to_string()),
            ..caso(0)
        },
        RawCaso {
            atendimento: Some("1234567".to_string()),
            paciente: Some("MARIA".to_string()),
            aviso: Some("4321".to_string()),
            prestador: Some("DR JOAO".to_string()),
            quarto: Some("999".to_string()),
            ..caso(1)
        },
    ];
    let saida = normalize_census(rows, "HSL", &[], &MostFrequentLongestFirst);
    assert_eq!(saida.len(), 1);
    assert_eq!(saida[0].quarto, "101");
}

#[test]
fn conflicting_avisos_resolve_per_admission_group() {
    let rows = vec![
        RawCaso {
            atendimento: Some("1234567".to_string()),
            aviso: Some("111".to_string()),
            prestador: Some("DR JOAO".to_string()),
            ..caso(0)
        },
        RawCaso {
            atendimento: Some("1234567".to_string()),
            aviso: Some("222".to_string()),
            prestador: Some("DR PEDRO".to_string()),
            ..caso(1)
        },
        RawCaso {
            atendimento: Some("1234567".to_string()),
            aviso: Some("222".to_string()),
            prestador: Some("DR ANA".to_string()),
            ..caso(2)
        },
    ];
    let saida = normalize_census(rows, "HSL", &[], &MostFrequentLongestFirst);
    assert_eq!(saida.len(), 3);
    assert!(saida.iter().all(|r| r.aviso == "222"));
}

#[test]
fn rows_without_any_pillar_are_dropped() {
    let rows = vec![RawCaso {
        prestador: Some("DR JOAO".to_string()),
        convenio: Some("UNIMED".to_string()),
        ..caso(0)
    }];
    let saida = normalize_census(rows, "HSL", &[], &MostFrequentLongestFirst);
    assert!(saida.is_empty());
}
