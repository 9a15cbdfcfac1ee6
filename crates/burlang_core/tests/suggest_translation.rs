use burlang_core::db::open_db_in_memory;
use burlang_core::repo::word_repo::{SqliteWordRepository, WordRepository};
use burlang_core::{
    compose, CoreConfig, Language, PageRequest, SuggestWordOutcome, SuggestionStatus,
    TranslationOutcome, UserId, VocabularyError, VocabularyService, WordDraft,
    WordValidationError,
};
use rusqlite::Connection;

const FIRST: UserId = 10;
const SECOND: UserId = 20;

fn register(service: &VocabularyService<'_>) {
    service.register_user(FIRST, Some("first"), None).unwrap();
    service.register_user(SECOND, Some("second"), None).unwrap();
}

fn accept_directly(conn: &Connection, language: Language, text: &str) -> uuid::Uuid {
    let words = SqliteWordRepository::try_new(conn).unwrap();
    words
        .insert_accepted(&WordDraft::new(language, text).validate().unwrap(), None)
        .unwrap()
}

fn rating(service: &VocabularyService<'_>, id: UserId) -> i64 {
    service.user_profile(id).unwrap().rating
}

#[test]
fn suggest_word_creates_then_joins_without_double_credit() {
    let conn = open_db_in_memory().unwrap();
    let service = compose(&conn, &CoreConfig::default());
    register(&service);

    let draft = WordDraft::new(Language::Russian, "Ёлка").with_theme("Nature");
    let created = service.suggest_word(FIRST, &draft).unwrap();
    let id = match created {
        SuggestWordOutcome::Created { suggestion } => {
            assert_eq!(suggestion.normalized_text, "елка");
            assert_eq!(suggestion.status, SuggestionStatus::New);
            assert_eq!(suggestion.author, Some(FIRST));
            assert_eq!(suggestion.contributors, vec![FIRST]);
            assert_eq!(suggestion.themes, vec!["nature".to_string()]);
            suggestion.uuid
        }
        other => panic!("unexpected outcome: {other:?}"),
    };

    let again = service
        .suggest_word(FIRST, &WordDraft::new(Language::Russian, "елка").with_theme("winter"))
        .unwrap();
    match again {
        SuggestWordOutcome::Joined {
            suggestion,
            contributor_added,
            ..
        } => {
            assert_eq!(suggestion.uuid, id);
            assert!(!contributor_added);
            assert_eq!(
                suggestion.themes,
                vec!["nature".to_string(), "winter".to_string()]
            );
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(rating(&service, FIRST), 1);
}

#[test]
fn suggest_word_for_accepted_text_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = compose(&conn, &CoreConfig::default());
    register(&service);
    let accepted = accept_directly(&conn, Language::Buryat, "нохой");

    let outcome = service
        .suggest_word(FIRST, &WordDraft::new(Language::Buryat, "Нохой"))
        .unwrap();
    assert!(matches!(
        outcome,
        SuggestWordOutcome::AlreadyAccepted { ref word } if word.uuid == accepted
    ));
    assert_eq!(rating(&service, FIRST), 0);
    let page = service
        .paginate_suggested(Language::Buryat, None, PageRequest::default())
        .unwrap();
    assert_eq!(page.total, 0);
}

#[test]
fn suggest_word_rejects_invalid_input_and_unknown_users() {
    let conn = open_db_in_memory().unwrap();
    let service = compose(&conn, &CoreConfig::default());
    register(&service);

    let err = service
        .suggest_word(FIRST, &WordDraft::new(Language::Russian, " ... "))
        .unwrap_err();
    assert!(matches!(
        err,
        VocabularyError::Validation(WordValidationError::EmptyText)
    ));
    assert_eq!(err.code(), "validation_failed");

    let err = service
        .suggest_word(FIRST, &WordDraft::new(Language::Russian, "дом").with_dialect("  "))
        .unwrap_err();
    assert!(matches!(
        err,
        VocabularyError::Validation(WordValidationError::BlankDialect)
    ));

    let err = service
        .suggest_word(999, &WordDraft::new(Language::Russian, "дом"))
        .unwrap_err();
    assert!(matches!(err, VocabularyError::UserNotFound(999)));
}

#[test]
fn linking_two_accepted_words_credits_each_new_contributor_once() {
    let conn = open_db_in_memory().unwrap();
    let service = compose(&conn, &CoreConfig::default());
    register(&service);
    let russian = accept_directly(&conn, Language::Russian, "вода");
    let buryat = accept_directly(&conn, Language::Buryat, "уһан");

    let source = WordDraft::new(Language::Russian, "Вода");
    match service.suggest_translation(FIRST, &source, "Уһан").unwrap() {
        TranslationOutcome::Linked {
            word,
            translation,
            new_link,
        } => {
            assert!(new_link);
            assert_eq!(word.uuid, russian);
            assert_eq!(translation.uuid, buryat);
            assert_eq!(word.translations, vec![buryat]);
            assert_eq!(translation.translations, vec![russian]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(rating(&service, FIRST), 1);

    let repeat = service.suggest_translation(FIRST, &source, "уһан").unwrap();
    assert!(matches!(
        repeat,
        TranslationOutcome::Linked {
            new_link: false,
            ..
        }
    ));
    assert_eq!(rating(&service, FIRST), 1);

    match service.suggest_translation(SECOND, &source, "уһан").unwrap() {
        TranslationOutcome::Linked { word, new_link, .. } => {
            assert!(!new_link);
            assert_eq!(word.translations_u.len(), 1);
            assert_eq!(word.translations_u[0].contributors, vec![FIRST, SECOND]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(rating(&service, SECOND), 1);
}

#[test]
fn translation_of_accepted_word_waits_as_opposite_suggestion() {
    let conn = open_db_in_memory().unwrap();
    let service = compose(&conn, &CoreConfig::default());
    register(&service);
    let russian = accept_directly(&conn, Language::Russian, "солнце");

    let outcome = service
        .suggest_translation(FIRST, &WordDraft::new(Language::Russian, "солнце"), "Наран")
        .unwrap();
    match outcome {
        TranslationOutcome::PendingTranslation { word, suggestion } => {
            assert_eq!(word.uuid, russian);
            assert_eq!(suggestion.language, Language::Buryat);
            assert_eq!(suggestion.text, "Наран");
            assert_eq!(suggestion.author, Some(FIRST));
            assert_eq!(suggestion.pre_translations.len(), 1);
            assert_eq!(suggestion.pre_translations[0].text, "солнце");
            assert_eq!(suggestion.pre_translations[0].proposed_by, vec![FIRST]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(rating(&service, FIRST), 1);

    let repeat = service
        .suggest_translation(FIRST, &WordDraft::new(Language::Russian, "солнце"), "наран")
        .unwrap();
    assert!(matches!(repeat, TranslationOutcome::PendingTranslation { .. }));
    assert_eq!(rating(&service, FIRST), 1);
}

#[test]
fn second_proposer_of_pending_translation_is_kept_and_credited() {
    let conn = open_db_in_memory().unwrap();
    let service = compose(&conn, &CoreConfig::default());
    register(&service);
    accept_directly(&conn, Language::Russian, "небо");

    let source = WordDraft::new(Language::Russian, "небо");
    service.suggest_translation(FIRST, &source, "Тэнгэри").unwrap();
    let outcome = service.suggest_translation(SECOND, &source, "тэнгэри").unwrap();

    match outcome {
        TranslationOutcome::PendingTranslation { suggestion, .. } => {
            assert_eq!(suggestion.author, Some(FIRST));
            assert_eq!(suggestion.contributors, vec![FIRST, SECOND]);
            assert_eq!(suggestion.pre_translations.len(), 1);
            assert_eq!(suggestion.pre_translations[0].proposed_by, vec![FIRST, SECOND]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(rating(&service, FIRST), 1);
    assert_eq!(rating(&service, SECOND), 1);
}

#[test]
fn pending_source_collects_distinct_pre_translations() {
    let conn = open_db_in_memory().unwrap();
    let service = compose(&conn, &CoreConfig::default());
    register(&service);

    let source = WordDraft::new(Language::Buryat, "морин");
    service.suggest_translation(FIRST, &source, "конь").unwrap();
    let outcome = service.suggest_translation(SECOND, &source, "лошадь").unwrap();

    match outcome {
        TranslationOutcome::PendingSource { suggestion } => {
            let texts: Vec<_> = suggestion
                .pre_translations
                .iter()
                .map(|pre| pre.normalized_text.as_str())
                .collect();
            assert_eq!(texts, vec!["конь", "лошадь"]);
            assert_eq!(suggestion.contributors, vec![FIRST, SECOND]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn blank_translation_text_is_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let service = compose(&conn, &CoreConfig::default());
    register(&service);

    let err = service
        .suggest_translation(FIRST, &WordDraft::new(Language::Russian, "дом"), "   ")
        .unwrap_err();
    assert_eq!(err.code(), "validation_failed");
    let page = service
        .paginate_suggested(Language::Russian, None, PageRequest::default())
        .unwrap();
    assert_eq!(page.total, 0);
}
