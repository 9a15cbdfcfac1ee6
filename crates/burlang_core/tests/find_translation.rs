use burlang_core::db::open_db_in_memory;
use burlang_core::repo::search_repo::{SearchRepository, SqliteSearchRepository};
use burlang_core::repo::word_repo::{SqliteWordRepository, WordRepository};
use burlang_core::{
    compose, CoreConfig, Language, PageRequest, UserId, VocabularyError, WordDraft,
};

const READER: UserId = 7;

#[test]
fn find_returns_word_with_translations_and_records_the_hit() {
    let conn = open_db_in_memory().unwrap();
    let service = compose(&conn, &CoreConfig::default());
    service.register_user(READER, Some("reader"), None).unwrap();

    let words = SqliteWordRepository::try_new(&conn).unwrap();
    let russian_id = words
        .insert_accepted(&WordDraft::new(Language::Russian, "Книга").validate().unwrap(), None)
        .unwrap();
    let buryat_id = words
        .insert_accepted(&WordDraft::new(Language::Buryat, "ном").validate().unwrap(), None)
        .unwrap();
    let russian = words.get_accepted(russian_id).unwrap().unwrap();
    let buryat = words.get_accepted(buryat_id).unwrap().unwrap();
    words.link_translation(&russian, &buryat, None).unwrap();

    let result = service
        .find_translation(Some(READER), Language::Russian, "  КНИГА? ")
        .unwrap();
    assert_eq!(result.query, "КНИГА?");
    assert_eq!(result.normalized_text, "книга");
    assert_eq!(result.word.as_ref().map(|w| w.uuid), Some(russian_id));
    assert_eq!(result.translations.len(), 1);
    assert_eq!(result.translations[0].uuid, buryat_id);

    let found = result.history.found.unwrap();
    assert_eq!(found.word, russian_id);
    assert_eq!(found.language, Language::Russian);
    assert_eq!(result.history.user, Some(READER));
}

#[test]
fn misses_are_recorded_and_counted_per_normalized_text() {
    let conn = open_db_in_memory().unwrap();
    let service = compose(&conn, &CoreConfig::default());

    let first = service
        .find_translation(None, Language::Buryat, "Баяртай")
        .unwrap();
    assert!(first.word.is_none());
    assert!(first.translations.is_empty());
    assert!(first.history.found.is_none());
    assert_eq!(first.history.user, None);

    service
        .find_translation(None, Language::Buryat, "баяртай!")
        .unwrap();

    let searches = SqliteSearchRepository::try_new(&conn).unwrap();
    let searched = searches
        .find_searched(Language::Buryat, "баяртай")
        .unwrap()
        .unwrap();
    assert_eq!(searched.search_count, 2);
    assert_eq!(searched.text, "Баяртай");
    assert_eq!(searched.uuid, first.history.searched);
}

#[test]
fn unknown_user_and_blank_text_leave_no_history() {
    let conn = open_db_in_memory().unwrap();
    let service = compose(&conn, &CoreConfig::default());
    service.register_user(READER, None, None).unwrap();

    let err = service
        .find_translation(Some(404), Language::Russian, "дом")
        .unwrap_err();
    assert!(matches!(err, VocabularyError::UserNotFound(404)));

    let err = service
        .find_translation(Some(READER), Language::Russian, " -- ")
        .unwrap_err();
    assert_eq!(err.code(), "validation_failed");

    let searches = SqliteSearchRepository::try_new(&conn).unwrap();
    assert!(searches
        .find_searched(Language::Russian, "дом")
        .unwrap()
        .is_none());
    let history = service
        .search_history(READER, PageRequest::default())
        .unwrap();
    assert_eq!(history.total, 0);
}
