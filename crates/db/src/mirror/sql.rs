//! SQL text for each mirror phase. Identifiers come from a validated
//! [`TableSpec`] and are always double quoted.

use super::models::{TableSpec, STAGED_SEQ_COLUMN, SURROGATE_COLUMN};

fn quote(name: &str) -> String {
    format!("\"{name}\"")
}

fn column_list(spec: &TableSpec) -> String {
    std::iter::once(spec.key().name)
        .chain(spec.columns().iter().map(|c| c.name))
        .map(quote)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn create_schema(spec: &TableSpec) -> String {
    format!("create schema if not exists {}", quote(spec.schema()))
}

pub fn create_target(spec: &TableSpec) -> String {
    let mut defs = vec![
        format!("{} bigserial primary key", quote(SURROGATE_COLUMN)),
        format!(
            "{} {} not null unique",
            quote(spec.key().name),
            spec.key().kind.sql_type()
        ),
    ];
    defs.extend(
        spec.columns()
            .iter()
            .map(|c| format!("{} {}", quote(c.name), c.kind.sql_type())),
    );

    format!(
        "create table if not exists {} (\n  {}\n)",
        spec.qualified_target(),
        defs.join(",\n  ")
    )
}

pub fn create_staging(spec: &TableSpec) -> String {
    let mut defs = vec![
        format!(
            "{} bigint generated always as identity",
            quote(STAGED_SEQ_COLUMN)
        ),
        format!("{} {}", quote(spec.key().name), spec.key().kind.sql_type()),
    ];
    defs.extend(
        spec.columns()
            .iter()
            .map(|c| format!("{} {}", quote(c.name), c.kind.sql_type())),
    );

    format!(
        "create table if not exists {} (\n  {}\n)",
        spec.qualified_staging(),
        defs.join(",\n  ")
    )
}

pub fn clear_staging(spec: &TableSpec) -> String {
    format!("truncate table {} restart identity", spec.qualified_staging())
}

pub fn copy_into_staging(spec: &TableSpec) -> String {
    format!(
        "copy {} ({}) from stdin with (format text)",
        spec.qualified_staging(),
        column_list(spec)
    )
}

/// Upsert one row per staged key. Duplicate keys resolve to the row loaded
/// last; rows whose tracked values already match are left untouched.
pub fn upsert_from_staging(spec: &TableSpec) -> String {
    let key = quote(spec.key().name);
    let columns = column_list(spec);

    let conflict_action = if spec.columns().is_empty() {
        "do nothing".to_owned()
    } else {
        let assignments = spec
            .columns()
            .iter()
            .map(|c| format!("{0} = excluded.{0}", quote(c.name)))
            .collect::<Vec<_>>()
            .join(",\n    ");
        let current = spec
            .columns()
            .iter()
            .map(|c| format!("target.{}", quote(c.name)))
            .collect::<Vec<_>>()
            .join(", ");
        let incoming = spec
            .columns()
            .iter()
            .map(|c| format!("excluded.{}", quote(c.name)))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "do update set\n    {assignments}\n  where ({current}) is distinct from ({incoming})"
        )
    };

    format!(
        "insert into {target} as target ({columns})\n\
         select distinct on ({key}) {columns}\n\
         from {staging}\n\
         order by {key}, {seq} desc\n\
         on conflict ({key}) {conflict_action}",
        target = spec.qualified_target(),
        staging = spec.qualified_staging(),
        seq = quote(STAGED_SEQ_COLUMN),
    )
}

pub fn prune_missing(spec: &TableSpec) -> String {
    let key = quote(spec.key().name);
    format!(
        "delete from {target} as target\n\
         where not exists (\n  select 1 from {staging} as staged where staged.{key} = target.{key}\n)",
        target = spec.qualified_target(),
        staging = spec.qualified_staging(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::models::ColumnSpec;

    const COLUMNS: &[ColumnSpec] = &[
        ColumnSpec::varchar("dealname", 255),
        ColumnSpec::amount("amount"),
        ColumnSpec::timestamp("closedate"),
    ];

    fn spec() -> TableSpec {
        TableSpec::new(
            "hubspot",
            "deals",
            ColumnSpec::varchar("hs_object_id", 50),
            COLUMNS,
        )
        .unwrap()
    }

    #[test]
    fn target_ddl_has_surrogate_and_unique_key() {
        let ddl = create_target(&spec());
        assert!(ddl.starts_with("create table if not exists \"hubspot\".\"deals\""));
        assert!(ddl.contains("\"id\" bigserial primary key"));
        assert!(ddl.contains("\"hs_object_id\" varchar(50) not null unique"));
        assert!(ddl.contains("\"amount\" numeric(15,2)"));
        assert!(ddl.contains("\"closedate\" timestamptz"));
    }

    #[test]
    fn staging_ddl_has_no_constraints() {
        let ddl = create_staging(&spec());
        assert!(ddl.contains("\"hubspot\".\"deals_staging\""));
        assert!(ddl.contains("\"staged_seq\" bigint generated always as identity"));
        assert!(ddl.contains("\"hs_object_id\" varchar(50)"));
        assert!(!ddl.contains("unique"));
        assert!(!ddl.contains("primary key"));
    }

    #[test]
    fn copy_lists_key_then_tracked_columns() {
        assert_eq!(
            copy_into_staging(&spec()),
            "copy \"hubspot\".\"deals_staging\" (\"hs_object_id\", \"dealname\", \"amount\", \"closedate\") from stdin with (format text)"
        );
    }

    #[test]
    fn upsert_takes_last_staged_row_per_key() {
        let sql = upsert_from_staging(&spec());
        assert!(sql.contains("select distinct on (\"hs_object_id\")"));
        assert!(sql.contains("order by \"hs_object_id\", \"staged_seq\" desc"));
        assert!(sql.contains("on conflict (\"hs_object_id\") do update set"));
        assert!(sql.contains("\"amount\" = excluded.\"amount\""));
        assert!(sql.contains("is distinct from (excluded.\"dealname\", excluded.\"amount\", excluded.\"closedate\")"));
    }

    #[test]
    fn upsert_without_tracked_columns_does_nothing_on_conflict() {
        let spec = TableSpec::new("hubspot", "ids", ColumnSpec::text("hs_object_id"), &[]).unwrap();
        assert!(upsert_from_staging(&spec).ends_with("on conflict (\"hs_object_id\") do nothing"));
    }

    #[test]
    fn prune_anti_joins_on_staging_key() {
        let sql = prune_missing(&spec());
        assert!(sql.starts_with("delete from \"hubspot\".\"deals\" as target"));
        assert!(sql.contains("staged.\"hs_object_id\" = target.\"hs_object_id\""));
    }

    #[test]
    fn clear_staging_truncates_and_resets_sequence() {
        assert_eq!(
            clear_staging(&spec()),
            "truncate table \"hubspot\".\"deals_staging\" restart identity"
        );
    }
}
