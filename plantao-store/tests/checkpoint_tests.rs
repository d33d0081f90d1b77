use plantao_store::{Store, StoreError, checkpoint};
use plantao_types::AtendimentoRow;

fn sample_row(n: u32) -> AtendimentoRow {
    AtendimentoRow {
        hospital: "HSL".to_string(),
        data: "05/03/2024".to_string(),
        atendimento: format!("{:07}", n),
        paciente: format!("PACIENTE {n}"),
        prestador: "DR A".to_string(),
        ..Default::default()
    }
}

#[test]
fn checkpoint_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = checkpoint(dir.path().join("nao-existe.db"));
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[test]
fn checkpoint_folds_wal_into_main_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plantao.db");

    // Keep the writing handle open so SQLite's close-time checkpoint cannot
    // fold the WAL for us.
    let store = Store::open(&path).unwrap();
    for n in 0..50 {
        store.upsert_atendimento(&sample_row(n)).unwrap();
    }

    // A copy of only the main file misses rows still sitting in the WAL.
    let before = dir.path().join("antes.db");
    std::fs::copy(&path, &before).unwrap();
    let seen_before = Store::open(&before).unwrap().count_atendimentos().unwrap();
    assert!(seen_before < 50, "expected rows in the WAL, saw {seen_before}");

    checkpoint(&path).unwrap();

    let after = dir.path().join("depois.db");
    std::fs::copy(&path, &after).unwrap();
    assert_eq!(Store::open(&after).unwrap().count_atendimentos().unwrap(), 50);
}

#[test]
fn checkpoint_truncates_the_wal_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plantao.db");

    let store = Store::open(&path).unwrap();
    for n in 0..50 {
        store.upsert_atendimento(&sample_row(n)).unwrap();
    }

    checkpoint(&path).unwrap();

    let wal = dir.path().join("plantao.db-wal");
    if wal.exists() {
        assert_eq!(std::fs::metadata(&wal).unwrap().len(), 0);
    }
}

#[test]
fn checkpoint_twice_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plantao.db");

    let store = Store::open(&path).unwrap();
    store.upsert_atendimento(&sample_row(1)).unwrap();

    checkpoint(&path).unwrap();
    checkpoint(&path).unwrap();

    let copy = dir.path().join("copia.db");
    std::fs::copy(&path, &copy).unwrap();
    assert_eq!(Store::open(&copy).unwrap().count_atendimentos().unwrap(), 1);
}
