//! Integration tests for the member repository
//!
//! These tests run every member query against PostgreSQL. Each test works
//! in a fresh schema; set `DATABASE_URL` to run them.

mod common;

use common::setup_test_db;
use member_store::domain::member::{Member, MemberDto, TeamLink};
use member_store::domain::paging::{Direction, PageRequest, Sort};
use member_store::domain::repositories::{MemberRepository, TeamRepository};
use member_store::domain::team::Team;
use member_store::infrastructure::db::begin_read_only;
use member_store::infrastructure::repositories::{
    PostgresMemberRepository, PostgresTeamRepository,
};
use member_store::RepositoryError;
use sqlx::PgPool;

fn repositories(pool: &PgPool) -> (PostgresMemberRepository, PostgresTeamRepository) {
    (
        PostgresMemberRepository::new(pool.clone()),
        PostgresTeamRepository::new(pool.clone()),
    )
}

async fn save_member(repo: &PostgresMemberRepository, username: &str, age: i32) -> Member {
    repo.save(Member::with_age(username, age).expect("valid member"))
        .await
        .expect("Failed to save member")
}

async fn save_team(repo: &PostgresTeamRepository, name: &str) -> Team {
    repo.save(Team::new(name).expect("valid team"))
        .await
        .expect("Failed to save team")
}

#[tokio::test]
async fn test_basic_crud() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let (member_repo, _) = repositories(&db.pool);

    let member1 = save_member(&member_repo, "member1", 0).await;
    let member2 = save_member(&member_repo, "member2", 0).await;
    assert!(member1.id().is_some(), "Saved member should have an id");
    assert_ne!(member1.id(), member2.id());

    let found1 = member_repo
        .find_by_id(member1.id().unwrap())
        .await
        .expect("Failed to find member1")
        .expect("member1 should exist");
    let found2 = member_repo
        .find_by_id(member2.id().unwrap())
        .await
        .expect("Failed to find member2")
        .expect("member2 should exist");

    assert_eq!(found1, member1);
    assert_eq!(found2, member2);
    assert_eq!(found1.username(), "member1");

    let all = member_repo.find_all().await.expect("Failed to find all");
    assert_eq!(all.len(), 2);
    assert_eq!(member_repo.count().await.unwrap(), 2);

    member_repo.delete(&member1).await.expect("Failed to delete");
    member_repo.delete(&member2).await.expect("Failed to delete");
    assert_eq!(member_repo.count().await.unwrap(), 0);

    db.cleanup().await;
}

#[tokio::test]
async fn test_save_updates_existing_member() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let (member_repo, _) = repositories(&db.pool);

    let mut member = save_member(&member_repo, "member1", 10).await;
    member.change_username("renamed").unwrap();
    member.change_age(11).unwrap();

    let updated = member_repo.save(member.clone()).await.expect("Failed to update");
    assert_eq!(updated.id(), member.id());
    assert_eq!(member_repo.count().await.unwrap(), 1, "Update must not insert");

    let found = member_repo
        .find_by_id(member.id().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.username(), "renamed");
    assert_eq!(found.age(), 11);

    db.cleanup().await;
}

#[tokio::test]
async fn test_update_of_missing_member_fails() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let (member_repo, _) = repositories(&db.pool);

    let member = save_member(&member_repo, "member1", 10).await;
    member_repo.delete_by_id(member.id().unwrap()).await.unwrap();

    let result = member_repo.save(member).await;
    assert!(matches!(
        result,
        Err(RepositoryError::NotFound { entity: "Member", .. })
    ));

    let result = member_repo.delete_by_id(9_999).await;
    assert!(matches!(result, Err(RepositoryError::NotFound { .. })));

    db.cleanup().await;
}

#[tokio::test]
async fn test_find_by_username_and_age_greater_than() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let (member_repo, _) = repositories(&db.pool);

    save_member(&member_repo, "AAA", 10).await;
    save_member(&member_repo, "BBB", 20).await;

    let members = member_repo
        .find_by_username_and_age_greater_than("BBB", 15)
        .await
        .expect("Query failed");

    assert_eq!(members.len(), 1);
    assert_eq!(members[0].username(), "BBB");
    assert_eq!(members[0].age(), 20);

    let none = member_repo
        .find_by_username_and_age_greater_than("BBB", 20)
        .await
        .expect("Query failed");
    assert!(none.is_empty(), "Comparison must be strict");

    db.cleanup().await;
}

#[tokio::test]
async fn test_find_user() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let (member_repo, _) = repositories(&db.pool);

    save_member(&member_repo, "AAA", 10).await;
    save_member(&member_repo, "BBB", 20).await;

    let members = member_repo.find_user("BBB", 20).await.expect("Query failed");
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].username(), "BBB");

    let members = member_repo.find_user("BBB", 10).await.expect("Query failed");
    assert!(members.is_empty());

    db.cleanup().await;
}

#[tokio::test]
async fn test_find_username_list() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let (member_repo, _) = repositories(&db.pool);

    save_member(&member_repo, "AAA", 10).await;
    save_member(&member_repo, "BBB", 20).await;

    let names = member_repo.find_username_list().await.expect("Query failed");
    assert_eq!(names, vec!["AAA".to_string(), "BBB".to_string()]);

    db.cleanup().await;
}

#[tokio::test]
async fn test_find_member_dto() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let (member_repo, team_repo) = repositories(&db.pool);

    let team = save_team(&team_repo, "teamA").await;
    let member = member_repo
        .save(Member::with_team("AAA", 10, &team).unwrap())
        .await
        .expect("Failed to save member");
    // Members without a team are not part of the projection
    save_member(&member_repo, "BBB", 20).await;

    let dtos = member_repo.find_member_dto().await.expect("Query failed");

    assert_eq!(
        dtos,
        vec![MemberDto::new(
            member.id().unwrap(),
            "AAA",
            Some("teamA".to_string())
        )]
    );

    db.cleanup().await;
}

#[tokio::test]
async fn test_find_by_names() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let (member_repo, _) = repositories(&db.pool);

    save_member(&member_repo, "AAA", 10).await;
    save_member(&member_repo, "BBB", 20).await;
    save_member(&member_repo, "CCC", 30).await;

    let members = member_repo
        .find_by_names(&["AAA".to_string(), "BBB".to_string()])
        .await
        .expect("Query failed");

    let names: Vec<&str> = members.iter().map(|m| m.username()).collect();
    assert_eq!(names, vec!["AAA", "BBB"]);

    let empty = member_repo.find_by_names(&[]).await.expect("Query failed");
    assert!(empty.is_empty());

    db.cleanup().await;
}

#[tokio::test]
async fn test_paging() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let (member_repo, _) = repositories(&db.pool);

    for name in ["m1", "m2", "m3", "m4", "m5"] {
        save_member(&member_repo, name, 10).await;
    }
    save_member(&member_repo, "other", 30).await;

    let request =
        PageRequest::of_sorted(0, 3, Sort::by(Direction::Desc, &["username"])).unwrap();
    let page = member_repo
        .find_by_age(10, request.clone())
        .await
        .expect("Paging query failed");

    // The page covers every member; the age argument does not filter
    let names: Vec<&str> = page.content().iter().map(|m| m.username()).collect();
    assert_eq!(names, vec!["other", "m5", "m4"]);
    assert_eq!(page.number_of_elements(), 3);
    assert_eq!(page.total_elements(), 6);
    assert_eq!(page.number(), 0);
    assert_eq!(page.total_pages(), 2);
    assert!(page.is_first());
    assert!(page.has_next());

    let second = member_repo
        .find_by_age(10, request.next())
        .await
        .expect("Paging query failed");
    let names: Vec<&str> = second.content().iter().map(|m| m.username()).collect();
    assert_eq!(names, vec!["m3", "m2", "m1"]);
    assert_eq!(second.total_elements(), 6);
    assert!(second.is_last());

    let other_age = member_repo
        .find_by_age(30, request)
        .await
        .expect("Paging query failed");
    assert_eq!(other_age.total_elements(), 6);
    assert_eq!(other_age.number_of_elements(), 3);

    let dtos = page.map(|m| MemberDto::from_member(&m).expect("saved member"));
    assert_eq!(dtos.content()[0].username, "other");
    assert_eq!(dtos.content()[0].team_name, None);
    assert_eq!(dtos.total_elements(), 6);

    db.cleanup().await;
}

#[tokio::test]
async fn test_paging_beyond_last_page_still_counts() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let (member_repo, _) = repositories(&db.pool);

    for name in ["m1", "m2"] {
        save_member(&member_repo, name, 10).await;
    }

    let page = member_repo
        .find_by_age(10, PageRequest::of(5, 2).unwrap())
        .await
        .expect("Paging query failed");

    assert!(page.content().is_empty());
    assert_eq!(page.total_elements(), 2);
    assert_eq!(page.total_pages(), 1);

    db.cleanup().await;
}

#[tokio::test]
async fn test_paging_rejects_unknown_sort_property() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let (member_repo, _) = repositories(&db.pool);

    let request = PageRequest::of_sorted(0, 3, Sort::by(Direction::Asc, &["password"])).unwrap();
    let result = member_repo.find_by_age(10, request).await;

    assert!(matches!(
        result,
        Err(RepositoryError::InvalidSortProperty(p)) if p == "password"
    ));

    db.cleanup().await;
}

#[tokio::test]
async fn test_slice() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let (member_repo, _) = repositories(&db.pool);

    for name in ["m1", "m2", "m3", "m4", "m5"] {
        save_member(&member_repo, name, 10).await;
    }

    let request = PageRequest::of_sorted(0, 3, Sort::by(Direction::Asc, &["username"])).unwrap();
    let slice = member_repo
        .find_slice_by_age(10, request.clone())
        .await
        .expect("Slice query failed");

    assert_eq!(slice.number_of_elements(), 3);
    assert!(slice.has_next());

    let last = member_repo
        .find_slice_by_age(10, request.next())
        .await
        .expect("Slice query failed");
    let names: Vec<&str> = last.content().iter().map(|m| m.username()).collect();
    assert_eq!(names, vec!["m4", "m5"]);
    assert!(!last.has_next());

    db.cleanup().await;
}

#[tokio::test]
async fn test_bulk_update() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let (member_repo, _) = repositories(&db.pool);

    save_member(&member_repo, "m1", 10).await;
    save_member(&member_repo, "m2", 19).await;
    save_member(&member_repo, "m3", 20).await;
    save_member(&member_repo, "m4", 21).await;
    let m5 = save_member(&member_repo, "m5", 40).await;

    let result_count = member_repo.bulk_age_plus(20).await.expect("Bulk update failed");
    assert_eq!(result_count, 3);

    // The in-memory value is stale; reloading shows the new age
    assert_eq!(m5.age(), 40);
    let reloaded = member_repo
        .find_by_id(m5.id().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.age(), 41);

    let untouched = member_repo.find_user("m2", 19).await.unwrap();
    assert_eq!(untouched.len(), 1);

    db.cleanup().await;
}

#[tokio::test]
async fn test_find_member_lazy() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let (member_repo, team_repo) = repositories(&db.pool);

    let team_a = save_team(&team_repo, "teamA").await;
    let team_b = save_team(&team_repo, "teamB").await;
    let member1 = member_repo
        .save(Member::with_team("member1", 10, &team_a).unwrap())
        .await
        .unwrap();
    member_repo
        .save(Member::with_team("member2", 10, &team_b).unwrap())
        .await
        .unwrap();

    // Plain finder: only the foreign key is read
    let mut found = member_repo
        .find_by_id(member1.id().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.team_link(), &TeamLink::Unloaded(team_a.id().unwrap()));
    assert!(found.team().is_none());

    member_repo.load_team(&mut found).await.expect("Failed to load team");
    assert_eq!(found.team().map(|t| t.name()), Some("teamA"));

    // Entity graph finder: team is loaded with the member
    let members = member_repo
        .find_entity_graph_by_username("member1")
        .await
        .expect("Query failed");
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].team().map(|t| t.name()), Some("teamA"));

    db.cleanup().await;
}

#[tokio::test]
async fn test_fetch_join_and_entity_graph() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let (member_repo, team_repo) = repositories(&db.pool);

    let team_a = save_team(&team_repo, "teamA").await;
    let team_b = save_team(&team_repo, "teamB").await;
    member_repo
        .save(Member::with_team("member1", 10, &team_a).unwrap())
        .await
        .unwrap();
    member_repo
        .save(Member::with_team("member2", 20, &team_b).unwrap())
        .await
        .unwrap();
    save_member(&member_repo, "loner", 30).await;

    let fetched = member_repo
        .find_member_fetch_join()
        .await
        .expect("Fetch join failed");
    assert_eq!(fetched.len(), 2, "Fetch join skips members without a team");
    assert!(fetched.iter().all(|m| m.team_link().is_loaded()));
    assert_eq!(fetched[1].team().map(|t| t.name()), Some("teamB"));

    let graph = member_repo
        .find_member_entity_graph()
        .await
        .expect("Entity graph query failed");
    assert_eq!(graph.len(), 3);
    assert_eq!(graph[2].username(), "loner");
    assert_eq!(graph[2].team_link(), &TeamLink::None);

    let all = member_repo.find_all().await.expect("Find all failed");
    assert_eq!(all.len(), 3);
    assert!(all[0].team_link().is_loaded());

    db.cleanup().await;
}

#[tokio::test]
async fn test_find_read_only_by_username() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let (member_repo, _) = repositories(&db.pool);

    save_member(&member_repo, "member1", 10).await;

    let found = member_repo
        .find_read_only_by_username("member1")
        .await
        .expect("Read-only query failed")
        .expect("member1 should exist");
    assert_eq!(found.username(), "member1");

    let missing = member_repo
        .find_read_only_by_username("nobody")
        .await
        .expect("Read-only query failed");
    assert!(missing.is_none());

    save_member(&member_repo, "member1", 20).await;
    let result = member_repo.find_read_only_by_username("member1").await;
    assert!(matches!(
        result,
        Err(RepositoryError::NonUniqueResult {
            expected: 1,
            actual: 2
        })
    ));

    db.cleanup().await;
}

#[tokio::test]
async fn test_read_only_transaction_rejects_writes() {
    let Some(db) = setup_test_db().await else {
        return;
    };

    let mut tx = begin_read_only(&db.pool)
        .await
        .expect("Failed to begin read-only transaction");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
        .fetch_one(&mut *tx)
        .await
        .expect("Reads are allowed");
    assert_eq!(count, 0);

    let result = sqlx::query("INSERT INTO teams (name) VALUES ('teamA')")
        .execute(&mut *tx)
        .await;
    let code = match result {
        Err(sqlx::Error::Database(db_err)) => db_err.code().map(|c| c.into_owned()),
        other => panic!("Expected a database error, got {:?}", other),
    };
    assert_eq!(code.as_deref(), Some("25006"), "read_only_sql_transaction");

    tx.rollback().await.unwrap();
    db.cleanup().await;
}

#[tokio::test]
async fn test_find_lock_by_username() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let (member_repo, _) = repositories(&db.pool);

    save_member(&member_repo, "member1", 10).await;
    save_member(&member_repo, "member2", 10).await;

    let mut holder = db.pool.begin().await.unwrap();
    let locked = member_repo
        .find_lock_by_username(&mut *holder, "member1")
        .await
        .expect("Failed to lock member1");
    assert_eq!(locked.len(), 1);

    // A second transaction cannot take the same row lock
    let mut contender = db.pool.begin().await.unwrap();
    sqlx::query("SET LOCAL lock_timeout = '100ms'")
        .execute(&mut *contender)
        .await
        .unwrap();
    let result = member_repo
        .find_lock_by_username(&mut *contender, "member1")
        .await;
    assert!(
        matches!(result, Err(RepositoryError::LockTimeout(_))),
        "Expected lock timeout, got {:?}",
        result
    );
    contender.rollback().await.unwrap();

    // Other rows are not affected by the lock
    let mut other = db.pool.begin().await.unwrap();
    let locked = member_repo
        .find_lock_by_username(&mut *other, "member2")
        .await
        .expect("member2 should be lockable");
    assert_eq!(locked.len(), 1);
    other.commit().await.unwrap();

    holder.commit().await.unwrap();

    // Once released the lock can be taken again
    let mut next = db.pool.begin().await.unwrap();
    sqlx::query("SET LOCAL lock_timeout = '100ms'")
        .execute(&mut *next)
        .await
        .unwrap();
    let locked = member_repo
        .find_lock_by_username(&mut *next, "member1")
        .await
        .expect("Lock should be free after commit");
    assert_eq!(locked.len(), 1);
    next.commit().await.unwrap();

    db.cleanup().await;
}
