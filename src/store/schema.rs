pub const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS crashes (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        bundle_identifier TEXT NOT NULL,
        application_name  TEXT NOT NULL,
        affected_version  TEXT NOT NULL,
        system_version    TEXT NOT NULL DEFAULT '',
        platform          TEXT NOT NULL DEFAULT '',
        log               TEXT NOT NULL,
        timestamp         INTEGER NOT NULL,
        group_id          INTEGER NOT NULL DEFAULT 0,
        jailbreak         INTEGER NOT NULL DEFAULT 0,
        created_at        TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS crash_groups (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        bundle_identifier TEXT NOT NULL,
        affected_version  TEXT NOT NULL,
        pattern           TEXT NOT NULL,
        amount            INTEGER NOT NULL DEFAULT 0 CHECK (amount >= 0),
        latest_timestamp  INTEGER,
        fix_version       TEXT NOT NULL DEFAULT '',
        description       TEXT NOT NULL DEFAULT ''
    );

    CREATE TABLE IF NOT EXISTS versions (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        bundle_identifier TEXT NOT NULL,
        version           TEXT NOT NULL,
        status            TEXT NOT NULL DEFAULT 'unknown',
        UNIQUE(bundle_identifier, version)
    );

    CREATE UNIQUE INDEX IF NOT EXISTS idx_groups_key
        ON crash_groups(bundle_identifier, affected_version, pattern)
        WHERE pattern <> '';
    CREATE INDEX IF NOT EXISTS idx_crashes_group ON crashes(group_id);
    CREATE INDEX IF NOT EXISTS idx_crashes_app_version ON crashes(bundle_identifier, affected_version);
";
