//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.

diesel::table! {
    /// Accounts, including the eight statistics counter columns.
    ///
    /// Counters are only written by single-statement increments from
    /// `DieselUserRepository::adjust`.
    users (id) {
        id -> Uuid,
        name -> Text,
        username -> Text,
        email -> Text,
        password_hash -> Text,
        /// camelCase role tag.
        role -> Text,
        /// Present exactly for volunteers.
        area -> Nullable<Text>,
        profile_picture -> Text,
        is_active -> Bool,
        last_login -> Nullable<Timestamptz>,
        rescues_completed -> Int8,
        rescues_in_progress -> Int8,
        rescues_rescued -> Int8,
        save_count -> Int8,
        help_count -> Int8,
        requests_submitted -> Int8,
        requests_approved -> Int8,
        requests_rejected -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    rescue_requests (id) {
        id -> Uuid,
        informer_id -> Uuid,
        description -> Text,
        location -> Text,
        image_url -> Nullable<Text>,
        latitude -> Nullable<Float8>,
        longitude -> Nullable<Float8>,
        /// kebab-case status tag.
        status -> Text,
        assigned_to -> Nullable<Uuid>,
        /// Ordered array of `{message, timestamp}` objects.
        updates -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    notifications (id) {
        id -> Uuid,
        kind -> Text,
        target_user_id -> Nullable<Uuid>,
        target_role -> Nullable<Text>,
        content -> Text,
        rescue_request_id -> Nullable<Uuid>,
        is_read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(rescue_requests -> users (informer_id));
diesel::joinable!(notifications -> rescue_requests (rescue_request_id));

diesel::allow_tables_to_appear_in_same_query!(notifications, rescue_requests, users);
