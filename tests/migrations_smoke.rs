use sqlx::Row;

#[tokio::test]
async fn migrations_apply_and_tables_exist() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Skips silently when no disposable test database is configured.
    let Ok(database_url) = std::env::var("GRADEBOOK_TEST_DATABASE_URL") else {
        return Ok(());
    };

    let pool =
        sqlx::postgres::PgPoolOptions::new().max_connections(1).connect(&database_url).await?;

    let migrations_dir =
        std::env::var("GRADEBOOK_MIGRATIONS_DIR").unwrap_or_else(|_| "migrations".to_string());
    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(&migrations_dir)).await?;
    migrator.run(&pool).await?;

    let tables = [
        "quizzes",
        "quiz_questions",
        "question_options",
        "quiz_attempts",
        "assignments",
        "assignment_submissions",
        "course_grade_weights",
        "course_grades",
    ];

    for table in tables {
        let row = sqlx::query("SELECT to_regclass($1)::text").bind(table).fetch_one(&pool).await?;
        let regclass: Option<String> = row.try_get(0)?;
        assert!(regclass.is_some(), "expected table {table} to exist after migrations");
    }

    Ok(())
}
