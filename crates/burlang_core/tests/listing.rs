use burlang_core::db::open_db_in_memory;
use burlang_core::repo::word_repo::{SqliteWordRepository, WordRepository};
use burlang_core::{
    compose, CoreConfig, Language, PageRequest, SuggestionStatus, UserId, VocabularyError,
    WordDraft,
};
use std::collections::HashSet;

const USER: UserId = 5;

fn seed_accepted(conn: &rusqlite::Connection, language: Language, texts: &[&str]) {
    let words = SqliteWordRepository::try_new(conn).unwrap();
    for text in texts {
        words
            .insert_accepted(&WordDraft::new(language, *text).validate().unwrap(), None)
            .unwrap();
    }
}

#[test]
fn search_matches_prefix_in_normalized_order() {
    let conn = open_db_in_memory().unwrap();
    let service = compose(&conn, &CoreConfig::default());
    seed_accepted(&conn, Language::Buryat, &["сар", "Сайн", "сэсэг", "100%"]);

    let hits = service.search(Language::Buryat, "СА", 10).unwrap();
    let texts: Vec<_> = hits.iter().map(|w| w.normalized_text.as_str()).collect();
    assert_eq!(texts, vec!["сайн", "сар"]);

    let limited = service.search(Language::Buryat, "с", 1).unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].normalized_text, "сайн");

    assert!(service.search(Language::Russian, "са", 10).unwrap().is_empty());
    assert!(service.search(Language::Buryat, "   ", 10).unwrap().is_empty());
    assert!(service.search(Language::Buryat, "са", 0).unwrap().is_empty());
}

#[test]
fn search_treats_like_wildcards_literally() {
    let conn = open_db_in_memory().unwrap();
    let service = compose(&conn, &CoreConfig::default());
    seed_accepted(&conn, Language::Russian, &["100 процентов", "1_0", "10"]);

    assert!(service.search(Language::Russian, "1%0", 10).unwrap().is_empty());
    let underscore = service.search(Language::Russian, "1_0", 10).unwrap();
    assert_eq!(underscore.len(), 1);
    assert_eq!(underscore[0].text, "1_0");
}

#[test]
fn paginate_accepted_reports_totals_and_clamps_pages() {
    let conn = open_db_in_memory().unwrap();
    let service = compose(&conn, &CoreConfig::default());
    seed_accepted(
        &conn,
        Language::Russian,
        &["один", "два", "три", "четыре", "пять"],
    );

    let mut seen = HashSet::new();
    for page in 1..=3 {
        let result = service
            .paginate_accepted(Language::Russian, PageRequest::new(page, 2))
            .unwrap();
        assert_eq!(result.page, page);
        assert_eq!(result.per_page, 2);
        assert_eq!(result.total, 5);
        assert_eq!(result.total_pages, 3);
        for word in result.items {
            assert!(seen.insert(word.uuid));
        }
    }
    assert_eq!(seen.len(), 5);

    let first = service
        .paginate_accepted(Language::Russian, PageRequest::new(0, 2))
        .unwrap();
    assert_eq!(first.page, 1);
    assert_eq!(first.items.len(), 2);

    let beyond = service
        .paginate_accepted(Language::Russian, PageRequest::new(9, 2))
        .unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 5);

    let defaults = service
        .paginate_accepted(Language::Russian, PageRequest::default())
        .unwrap();
    assert_eq!(defaults.per_page, 20);
    assert_eq!(defaults.items.len(), 5);
}

#[test]
fn paginate_suggested_filters_by_status() {
    let conn = open_db_in_memory().unwrap();
    let service = compose(&conn, &CoreConfig::default());
    service.register_user(USER, None, None).unwrap();
    service.register_user(99, Some("admin"), None).unwrap();
    service.claim_first_admin(99).unwrap();

    for text in ["гал", "газар", "гар"] {
        service
            .suggest_word(USER, &WordDraft::new(Language::Buryat, text))
            .unwrap();
    }
    let all = service
        .paginate_suggested(Language::Buryat, None, PageRequest::default())
        .unwrap();
    assert_eq!(all.total, 3);

    service.decline(99, all.items[0].uuid).unwrap();

    let open = service
        .paginate_suggested(Language::Buryat, Some(SuggestionStatus::New), PageRequest::default())
        .unwrap();
    assert_eq!(open.total, 2);
    let rejected = service
        .paginate_suggested(
            Language::Buryat,
            Some(SuggestionStatus::Rejected),
            PageRequest::default(),
        )
        .unwrap();
    assert_eq!(rejected.total, 1);
    assert_eq!(rejected.items[0].uuid, all.items[0].uuid);
}

#[test]
fn search_history_is_newest_first_and_top_searches_by_count() {
    let conn = open_db_in_memory().unwrap();
    let service = compose(&conn, &CoreConfig::default());
    service.register_user(USER, None, None).unwrap();

    for text in ["мама", "папа", "мама", "брат", "мама", "папа"] {
        service
            .find_translation(Some(USER), Language::Russian, text)
            .unwrap();
    }
    service
        .find_translation(None, Language::Russian, "сестра")
        .unwrap();

    let history = service
        .search_history(USER, PageRequest::new(1, 4))
        .unwrap();
    assert_eq!(history.total, 6);
    assert_eq!(history.total_pages, 2);
    let texts: Vec<_> = history.items.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["папа", "мама", "брат", "мама"]);
    assert!(history.items.windows(2).all(|pair| pair[0].id > pair[1].id));

    let top = service.top_searches(Language::Russian, 2).unwrap();
    let ranked: Vec<_> = top
        .iter()
        .map(|w| (w.normalized_text.as_str(), w.search_count))
        .collect();
    assert_eq!(ranked, vec![("мама", 3), ("папа", 2)]);
    assert!(service.top_searches(Language::Buryat, 5).unwrap().is_empty());

    let err = service
        .search_history(404, PageRequest::default())
        .unwrap_err();
    assert!(matches!(err, VocabularyError::UserNotFound(404)));
}
