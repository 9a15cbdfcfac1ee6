use burlang_core::{
    init_logging_from, open_and_compose, CoreConfig, Language, SuggestWordOutcome, WordDraft,
};
use serde_json::Value;

#[test]
fn open_and_compose_persists_to_configured_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = CoreConfig {
        database_path: Some(dir.path().join("data").join("burlang.db")),
        ..CoreConfig::default()
    };

    {
        let composition = open_and_compose(&config).unwrap();
        let service = composition.service();
        service.register_user(1, Some("bair"), None).unwrap();
        service
            .suggest_word(1, &WordDraft::new(Language::Buryat, "сайн"))
            .unwrap();
    }

    let composition = open_and_compose(&config).unwrap();
    assert_eq!(composition.config(), &config);
    let service = composition.service();
    assert_eq!(service.user_profile(1).unwrap().rating, 1);
    let joined = service
        .suggest_word(1, &WordDraft::new(Language::Buryat, "Сайн"))
        .unwrap();
    assert!(matches!(joined, SuggestWordOutcome::Joined { .. }));
}

#[test]
fn in_memory_composition_when_no_path_is_configured() {
    let composition = open_and_compose(&CoreConfig::default()).unwrap();
    let version: u32 = composition
        .connection()
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, burlang_core::db::migrations::latest_version());
}

#[test]
fn outcomes_serialize_with_tagged_shape() {
    let composition = open_and_compose(&CoreConfig::default()).unwrap();
    let service = composition.service();
    service.register_user(1, None, None).unwrap();

    let outcome = service
        .suggest_word(1, &WordDraft::new(Language::Russian, "Дом").with_theme("быт"))
        .unwrap();
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["outcome"], Value::from("created"));
    assert_eq!(json["suggestion"]["language"], Value::from("russian"));
    assert_eq!(json["suggestion"]["status"], Value::from("new"));
    assert_eq!(json["suggestion"]["normalized_text"], Value::from("дом"));
    assert_eq!(json["suggestion"]["themes"][0], Value::from("быт"));
}

#[test]
fn file_logging_is_skipped_without_log_dir() {
    assert!(!init_logging_from(&CoreConfig::default()).unwrap());
}
