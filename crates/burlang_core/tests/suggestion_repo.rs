use burlang_core::db::open_db_in_memory;
use burlang_core::repo::suggestion_repo::{
    SqliteSuggestionRepository, SuggestionListQuery, SuggestionRepository, VoteChange,
};
use burlang_core::{Language, PreTranslation, RepoError, SuggestionStatus, WordDraft};
use rusqlite::Connection;

fn register(conn: &Connection, ids: &[i64]) {
    for id in ids {
        conn.execute("INSERT INTO telegram_users (id) VALUES (?1);", [id])
            .unwrap();
    }
}

#[test]
fn insert_makes_author_first_contributor() {
    let conn = open_db_in_memory().unwrap();
    register(&conn, &[1, 2]);
    let repo = SqliteSuggestionRepository::try_new(&conn).unwrap();

    let word = WordDraft::new(Language::Buryat, "Хадаг").with_theme("ritual");
    let id = repo.insert_suggested(&word.validate().unwrap(), Some(1)).unwrap();
    assert!(repo.add_suggested_contributor(id, 2).unwrap());
    assert!(!repo.add_suggested_contributor(id, 2).unwrap());

    let stored = repo.find_suggested(Language::Buryat, "хадаг").unwrap().unwrap();
    assert_eq!(stored.uuid, id);
    assert_eq!(stored.status, SuggestionStatus::New);
    assert_eq!(stored.author, Some(1));
    assert_eq!(stored.contributors, vec![1, 2]);
    assert_eq!(stored.co_contributors().collect::<Vec<_>>(), vec![2]);
    assert_eq!(stored.themes, vec!["ritual".to_string()]);
}

#[test]
fn pre_translations_are_unique_per_text_and_keep_every_proposer() {
    let conn = open_db_in_memory().unwrap();
    register(&conn, &[1, 2]);
    let repo = SqliteSuggestionRepository::try_new(&conn).unwrap();
    let id = repo
        .insert_suggested(&WordDraft::new(Language::Russian, "снег").validate().unwrap(), None)
        .unwrap();

    let first = PreTranslation::new("Саһан", "саһан", Some(2));
    assert!(repo.add_pre_translation(id, &first).unwrap());
    assert!(!repo.add_pre_translation(id, &first).unwrap());
    let second = PreTranslation::new("саһан", "саһан", Some(1));
    assert!(repo.add_pre_translation(id, &second).unwrap());

    let stored = repo.get_suggested(id).unwrap().unwrap();
    assert_eq!(stored.pre_translations.len(), 1);
    assert_eq!(stored.pre_translations[0].text, "Саһан");
    assert_eq!(stored.pre_translations[0].proposed_by, vec![1, 2]);
    assert!(stored.contributors.is_empty());

    repo.delete_suggested(id).unwrap();
    let orphans: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM suggested_pre_translation_proposers;",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphans, 0);
}

#[test]
fn status_changes_and_deletes_report_missing_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSuggestionRepository::try_new(&conn).unwrap();
    let id = repo
        .insert_suggested(&WordDraft::new(Language::Russian, "лёд").validate().unwrap(), None)
        .unwrap();

    repo.set_status(id, SuggestionStatus::Processing).unwrap();
    assert_eq!(
        repo.get_suggested(id).unwrap().unwrap().status,
        SuggestionStatus::Processing
    );

    repo.delete_suggested(id).unwrap();
    assert!(repo.get_suggested(id).unwrap().is_none());
    assert!(matches!(
        repo.delete_suggested(id).unwrap_err(),
        RepoError::SuggestionNotFound(missing) if missing == id
    ));
    assert!(matches!(
        repo.set_status(id, SuggestionStatus::New).unwrap_err(),
        RepoError::SuggestionNotFound(_)
    ));
}

#[test]
fn votes_are_tallied_changed_and_cascade_on_delete() {
    let conn = open_db_in_memory().unwrap();
    register(&conn, &[1, 2, 3]);
    let repo = SqliteSuggestionRepository::try_new(&conn).unwrap();
    let id = repo
        .insert_suggested(&WordDraft::new(Language::Buryat, "сэсэг").validate().unwrap(), None)
        .unwrap();

    assert_eq!(repo.record_vote(id, 1, true).unwrap(), VoteChange::First);
    assert_eq!(repo.record_vote(id, 2, false).unwrap(), VoteChange::First);
    assert_eq!(repo.record_vote(id, 3, true).unwrap(), VoteChange::First);
    assert_eq!(repo.record_vote(id, 2, false).unwrap(), VoteChange::Unchanged);
    assert_eq!(repo.record_vote(id, 2, true).unwrap(), VoteChange::Changed);

    let tally = repo.vote_tally(id).unwrap();
    assert_eq!((tally.approvals, tally.rejections), (3, 0));

    assert_eq!(repo.clear_votes(id).unwrap(), 3);
    assert_eq!(repo.vote_tally(id).unwrap().approvals, 0);

    repo.record_vote(id, 1, true).unwrap();
    repo.delete_suggested(id).unwrap();
    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM suggestion_votes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn list_and_count_filter_by_language_and_status() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSuggestionRepository::try_new(&conn).unwrap();
    for text in ["a1", "a2", "a3"] {
        repo.insert_suggested(&WordDraft::new(Language::Russian, text).validate().unwrap(), None)
            .unwrap();
    }
    let buryat = repo
        .insert_suggested(&WordDraft::new(Language::Buryat, "b1").validate().unwrap(), None)
        .unwrap();
    repo.set_status(buryat, SuggestionStatus::Rejected).unwrap();

    assert_eq!(repo.count_suggested(Language::Russian, None).unwrap(), 3);
    assert_eq!(
        repo.count_suggested(Language::Buryat, Some(SuggestionStatus::New))
            .unwrap(),
        0
    );

    let page = repo
        .list_suggested(&SuggestionListQuery {
            language: Language::Russian,
            status: Some(SuggestionStatus::New),
            limit: 2,
            offset: 2,
        })
        .unwrap();
    assert_eq!(page.len(), 1);

    let rejected = repo
        .list_suggested(&SuggestionListQuery {
            language: Language::Buryat,
            status: None,
            limit: 10,
            offset: 0,
        })
        .unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].status, SuggestionStatus::Rejected);
}
