// Kept in sync with `store::pg::CREATE_TODOS_TABLE`.

diesel::table! {
    todos (id) {
        id -> Uuid,
        title -> Varchar,
        description -> Varchar,
        completed -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
