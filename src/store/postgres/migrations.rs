use crate::store::error::{Result, StoreError};

/// Schema names are interpolated into SQL, so only plain identifiers pass
pub fn validate_schema_name(schema_name: &str) -> Result<()> {
    let mut chars = schema_name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_lowercase() || c == '_')
        .unwrap_or(false);
    let valid_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(StoreError::Connection(format!(
            "Invalid schema name '{}'",
            schema_name
        )))
    }
}

/// DDL creating the store tables if they do not exist yet
pub fn bootstrap_sql(schema_name: &str) -> String {
    format!(
        r#"
CREATE SCHEMA IF NOT EXISTS {s};

CREATE TABLE IF NOT EXISTS {s}.entities (
    app_id    TEXT   NOT NULL,
    namespace TEXT   NOT NULL,
    id        TEXT   NOT NULL,
    attrs     JSONB  NOT NULL DEFAULT '{{}}'::jsonb,
    seq       BIGSERIAL,
    PRIMARY KEY (app_id, namespace, id)
);

CREATE TABLE IF NOT EXISTS {s}.links (
    app_id    TEXT   NOT NULL,
    link      TEXT   NOT NULL,
    owner_id  TEXT   NOT NULL,
    member_id TEXT   NOT NULL,
    seq       BIGSERIAL,
    PRIMARY KEY (app_id, link, owner_id, member_id)
);

CREATE INDEX IF NOT EXISTS links_member_idx ON {s}.links (app_id, link, member_id);

CREATE TABLE IF NOT EXISTS {s}.transactions (
    tx_id      BIGSERIAL   PRIMARY KEY,
    app_id     TEXT        NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#,
        s = schema_name
    )
}
