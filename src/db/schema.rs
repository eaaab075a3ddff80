table! {
    categories (id) {
        id -> Int4,
        name -> Varchar,
        is_moderated -> Bool,
    }
}

table! {
    contents (id) {
        id -> Int4,
        title -> Varchar,
        summary -> Text,
        body -> Text,
        author -> Int4,
        category -> Int4,
        is_active -> Bool,
        state -> crate::db::types::Workflow_state,
        created_at -> Timestamp,
        published_at -> Nullable<Timestamp>,
        expires_at -> Nullable<Timestamp>,
    }
}

table! {
    transitions (id) {
        id -> Int8,
        content -> Int4,
        actor -> Nullable<Int4>,
        from_state -> crate::db::types::Workflow_state,
        to_state -> crate::db::types::Workflow_state,
        timestamp -> Timestamp,
        reason -> Nullable<Text>,
    }
}

joinable!(contents -> categories (category));
joinable!(transitions -> contents (content));

allow_tables_to_appear_in_same_query!(
    categories,
    contents,
    transitions,
);
