//! Contract type catalogue
//!
//! PLACSP encodes procurement types as short numeric codes (both one- and
//! two-digit spellings occur in the wild). The catalogue is seeded once with
//! the official mapping and grows itself when a feed carries a code we have
//! not seen before.

use sqlx::PgPool;
use tracing::info;

use crate::storage::Result;

/// Official PLACSP type codes, in both spellings publishers use
const KNOWN_TYPES: &[(&str, &str)] = &[
    ("1", "Obras"),
    ("2", "Servicios"),
    ("3", "Suministros"),
    ("4", "Concesión de obras"),
    ("5", "Concesión de servicios"),
    ("6", "Administrativo especial"),
    ("7", "Privado"),
    ("8", "Patrimonial"),
    ("01", "Obras"),
    ("02", "Servicios"),
    ("03", "Suministros"),
    ("04", "Concesión de obras"),
    ("05", "Concesión de servicios"),
    ("06", "Administrativo especial"),
    ("07", "Privado"),
    ("08", "Patrimonial"),
    ("21", "Gestión de servicios públicos"),
    ("22", "Concesión de servicios"),
    ("31", "Concesión de obras públicas"),
    ("32", "Concesión de obras"),
    ("50", "Patrimonial"),
    ("99", "Otro o mixto"),
    ("999", "No clasificado / error / legacy"),
];

/// Seed the catalogue with the official codes if it is empty.
///
/// Idempotent; a non-empty table is left untouched so manually registered
/// codes survive restarts.
pub async fn init_contract_types(pool: &PgPool) -> Result<()> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contract_types")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        info!(existing, "contract types already initialized, skipping seed");
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    for (code, description) in KNOWN_TYPES {
        sqlx::query(
            r#"
            INSERT INTO contract_types (code, description, is_known)
            VALUES ($1, $2, TRUE)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(code)
        .bind(description)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!(seeded = KNOWN_TYPES.len(), "contract types seeded");
    Ok(())
}

/// Look up the description for a type code, registering unseen codes as
/// unknown on the fly.
///
/// Missing or empty codes map to "Desconocido". The insert ignores
/// conflicts and re-reads, so concurrent lookups of the same new code are
/// safe.
pub async fn description_for_code(pool: &PgPool, code: Option<&str>) -> Result<String> {
    let Some(code) = code.filter(|c| !c.is_empty()) else {
        return Ok("Desconocido".to_string());
    };

    let found: Option<String> =
        sqlx::query_scalar("SELECT description FROM contract_types WHERE code = $1")
            .bind(code)
            .fetch_optional(pool)
            .await?;
    if let Some(description) = found {
        return Ok(description);
    }

    let fallback = format!("Tipo {code}");
    sqlx::query(
        r#"
        INSERT INTO contract_types (code, description, is_known)
        VALUES ($1, $2, FALSE)
        ON CONFLICT (code) DO NOTHING
        "#,
    )
    .bind(code)
    .bind(&fallback)
    .execute(pool)
    .await?;
    info!(code, "registered unknown contract type");

    let description: String =
        sqlx::query_scalar("SELECT description FROM contract_types WHERE code = $1")
            .bind(code)
            .fetch_one(pool)
            .await?;
    Ok(description)
}
