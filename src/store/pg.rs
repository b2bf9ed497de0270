use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};

use super::{parse_id, TodoStore};
use crate::errors::StoreError;
use crate::models::todo_model::{NewTodo, Todo, TodoPatch};
use crate::models::Pool;

/// Mirrors `schema::todos`.
pub const CREATE_TODOS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
    id UUID PRIMARY KEY,
    title VARCHAR(200) NOT NULL,
    description VARCHAR(1000) NOT NULL DEFAULT '',
    completed BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS todos_created_at_idx ON todos (created_at DESC);
"#;

type Conn = PooledConnection<ConnectionManager<PgConnection>>;

/// How long the health check waits for a pooled connection
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(1);

/// Todos in a PostgreSQL table, through an r2d2 pool
pub struct PgTodoStore {
    pool: Pool,
}

impl PgTodoStore {
    /// Builds the pool and makes sure the `todos` table exists.
    pub fn connect(database_url: &str, pool_size: u32) -> Result<Self, StoreError> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);

        let pool = Pool::builder().max_size(pool_size).build(manager)?;

        let store = Self { pool };

        store.conn()?.batch_execute(CREATE_TODOS_TABLE)?;

        Ok(store)
    }

    fn conn(&self) -> Result<Conn, StoreError> {
        Ok(self.pool.get()?)
    }
}

impl TodoStore for PgTodoStore {
    fn create(&self, new_todo: NewTodo) -> Result<Todo, StoreError> {
        use crate::schema::todos::dsl::*;

        let conn = &self.conn()?;

        let inserted = diesel::insert_into(todos)
            .values(&Todo::from_new(new_todo))
            .get_result::<Todo>(conn)?;

        Ok(inserted)
    }

    fn find_all(&self) -> Result<Vec<Todo>, StoreError> {
        use crate::schema::todos::dsl::*;

        let conn = &self.conn()?;

        Ok(todos.order(created_at.desc()).load::<Todo>(conn)?)
    }

    fn find_by_completed(&self, is_completed: bool) -> Result<Vec<Todo>, StoreError> {
        use crate::schema::todos::dsl::*;

        let conn = &self.conn()?;

        let list = todos
            .filter(completed.eq(is_completed))
            .order(created_at.desc())
            .load::<Todo>(conn)?;

        Ok(list)
    }

    fn find_by_id(&self, todo_id: &str) -> Result<Todo, StoreError> {
        use crate::schema::todos::dsl::*;

        let uid = parse_id(todo_id)?;
        let conn = &self.conn()?;

        Ok(todos.find(uid).first::<Todo>(conn)?)
    }

    fn update(&self, todo_id: &str, patch: &TodoPatch) -> Result<Todo, StoreError> {
        use crate::schema::todos::dsl::*;

        let mut todo = self.find_by_id(todo_id)?;

        todo.apply(patch)?;

        let conn = &self.conn()?;

        // A row deleted since the read surfaces as diesel's NotFound.
        let saved = diesel::update(todos.find(todo.id))
            .set((
                title.eq(&todo.title),
                description.eq(&todo.description),
                completed.eq(todo.completed),
                updated_at.eq(todo.updated_at),
            ))
            .get_result::<Todo>(conn)?;

        Ok(saved)
    }

    fn delete_by_id(&self, todo_id: &str) -> Result<Todo, StoreError> {
        use crate::schema::todos::dsl::*;

        let uid = parse_id(todo_id)?;
        let conn = &self.conn()?;

        Ok(diesel::delete(todos.find(uid)).get_result::<Todo>(conn)?)
    }

    fn delete_all(&self) -> Result<usize, StoreError> {
        use crate::schema::todos::dsl::*;

        let conn = &self.conn()?;

        Ok(diesel::delete(todos).execute(conn)?)
    }

    fn delete_all_completed(&self) -> Result<usize, StoreError> {
        use crate::schema::todos::dsl::*;

        let conn = &self.conn()?;

        Ok(diesel::delete(todos.filter(completed.eq(true))).execute(conn)?)
    }

    fn is_connected(&self) -> bool {
        match self.pool.get_timeout(HEALTH_CHECK_TIMEOUT) {
            Ok(conn) => conn.batch_execute("SELECT 1").is_ok(),
            Err(_) => false,
        }
    }
}
