use member_store::config::DatabaseConfig;
use member_store::domain::member::{Member, MemberDto};
use member_store::domain::paging::{Direction, PageRequest, Sort};
use member_store::domain::repositories::{MemberRepository, TeamRepository};
use member_store::domain::team::Team;
use member_store::infrastructure::db;
use member_store::infrastructure::repositories::{
    PostgresMemberRepository, PostgresTeamRepository,
};
use member_store::RepositoryResult;

/// Number of members created when the database is empty
const SAMPLE_MEMBER_COUNT: i32 = 100;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = DatabaseConfig::from_env();
    tracing::debug!(?config, "Loaded configuration");

    if let Err(e) = run(config).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(config: DatabaseConfig) -> RepositoryResult<()> {
    let pool = db::connect(&config).await?;
    db::run_migrations(&pool).await?;

    let members = PostgresMemberRepository::new(pool.clone());
    let teams = PostgresTeamRepository::new(pool);

    if members.count().await? == 0 {
        seed(&members, &teams).await?;
    }

    let request = PageRequest::of_sorted(0, 5, Sort::by(Direction::Desc, &["username"]))?;
    let page = members
        .find_by_age(10, request)
        .await?
        .map(|member| MemberDto::from_member(&member));

    tracing::info!(
        total = page.total_elements(),
        pages = page.total_pages(),
        "First member page"
    );
    for dto in page.content().iter().flatten() {
        tracing::info!("{}", dto);
    }

    Ok(())
}

/// Create two teams and a batch of members spread across them
async fn seed(
    members: &PostgresMemberRepository,
    teams: &PostgresTeamRepository,
) -> RepositoryResult<()> {
    let team_a = teams.save(Team::new("teamA")?).await?;
    let team_b = teams.save(Team::new("teamB")?).await?;

    for i in 0..SAMPLE_MEMBER_COUNT {
        let team = if i % 2 == 0 { &team_a } else { &team_b };
        let member = Member::with_team(format!("member{}", i), 10 + i % 5, team)?;
        members.save(member).await?;
    }

    tracing::info!(count = SAMPLE_MEMBER_COUNT, "Seeded sample members");
    Ok(())
}
