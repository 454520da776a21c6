//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts. `email` carries a unique constraint.
    accounts (id) {
        id -> Uuid,
        email -> Varchar,
        /// Argon2id PHC string.
        password_hash -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Uploaded documents.
    ///
    /// `status` is one of `UPLOADED`, `PROCESSING`, `COMPLETED`, `FAILED`, and
    /// a check constraint requires `result` to be set exactly when the
    /// status is `COMPLETED`.
    documents (id) {
        id -> Uuid,
        owner_id -> Uuid,
        filename -> Varchar,
        /// Storage location returned by the file store.
        file_path -> Text,
        status -> Varchar,
        result -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(documents -> accounts (owner_id));
diesel::allow_tables_to_appear_in_same_query!(accounts, documents);
