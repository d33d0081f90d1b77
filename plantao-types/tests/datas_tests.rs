use plantao_types::datas;

#[test]
fn parses_brazilian_spelling() {
    let d = datas::parse_flexible_date("31/01/2024").unwrap();
    assert_eq!(d.to_string(), "2024-01-31");
}

#[test]
fn parses_iso_spelling() {
    let d = datas::parse_flexible_date(" 2024-01-31 ").unwrap();
    assert_eq!(d.to_string(), "2024-01-31");
}

#[test]
fn rejects_impossible_dates() {
    assert!(datas::parse_flexible_date("31/02/2024").is_none());
    assert!(datas::parse_flexible_date("2024-13-01").is_none());
    assert!(datas::parse_flexible_date("amanhã").is_none());
}

#[test]
fn month_patterns_cover_both_spellings() {
    let (iso, br) = datas::month_like_patterns(2024, 3);
    assert_eq!(iso, "2024-03-%");
    assert_eq!(br, "%/03/2024");
}

#[test]
fn year_patterns_cover_both_spellings() {
    let (iso, br) = datas::year_like_patterns(2024);
    assert_eq!(iso, "2024-%");
    assert_eq!(br, "%/2024");
}

#[test]
fn now_timestamp_is_second_precision_iso() {
    let ts = datas::now_timestamp();
    // 2024-01-31T12:00:00
    assert_eq!(ts.len(), 19);
    assert_eq!(&ts[10..11], "T");
}
