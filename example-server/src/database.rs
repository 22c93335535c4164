use sqlx::sqlite::SqlitePool;

pub async fn setup(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Create users table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Component slugs are unique per owner; this constraint is what finally
    // decides a slug race, not the resolver
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS components (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            name TEXT NOT NULL,
            component_slug TEXT NOT NULL,
            likes_count INTEGER DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (user_id, component_slug)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Demo slugs are unique per component
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS demos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            component_id INTEGER NOT NULL REFERENCES components(id),
            name TEXT NOT NULL,
            demo_slug TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (component_id, demo_slug)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Seed sample data if tables are empty
    seed_sample_data(pool).await?;

    Ok(())
}

async fn seed_sample_data(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Check if users table already has data
    let user_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if user_count.0 > 0 {
        tracing::info!("sample data already present, skipping seed");
        return Ok(());
    }

    for username in ["alice", "bob", "carol"] {
        sqlx::query("INSERT INTO users (username) VALUES (?)")
            .bind(username)
            .execute(pool)
            .await?;
    }

    // A few colliding slugs so the suffix search has something to do
    let components = [
        (1, "My Button", "my-button"),
        (1, "My Button", "my-button-1"),
        (1, "Card Grid", "card-grid"),
        (2, "My Button", "my-button"),
        (3, "Hero Section", "hero-section"),
    ];

    for (user_id, name, slug) in components {
        sqlx::query("INSERT INTO components (user_id, name, component_slug) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(name)
            .bind(slug)
            .execute(pool)
            .await?;
    }

    for (component_id, name, slug) in [(1, "Default", "default"), (1, "Dark Mode", "dark-mode")] {
        sqlx::query("INSERT INTO demos (component_id, name, demo_slug) VALUES (?, ?, ?)")
            .bind(component_id)
            .bind(name)
            .bind(slug)
            .execute(pool)
            .await?;
    }

    tracing::info!("sample data seeded: 3 users, 5 components, 2 demos");
    Ok(())
}
