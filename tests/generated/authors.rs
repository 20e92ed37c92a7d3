// Code generated by rustf-querygen. DO NOT EDIT.
// versions:
//   rustf-querygen v0.1.0
// source: query/authors.sql

use rustf_querygen::runtime as rt;
#[allow(unused_imports)]
use rustf_querygen::runtime::{FromRow as _, FromSql as _, ToSql as _};
#[allow(unused_imports)]
use super::models::*;

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAuthorBioParams {
    pub bio: ::std::option::Option<::std::string::String>,
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateAuthorParams {
    pub name: ::std::string::String,
    pub mood: Mood,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListAuthorsByMoodRow {
    pub id: i64,
    pub name: ::std::string::String,
}

impl rt::FromRow for ListAuthorsByMoodRow {
    fn from_row(row: &rt::Row) -> rt::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadAuthorsParams {
    pub name: ::std::string::String,
    pub bio: ::std::option::Option<::std::string::String>,
}

pub const GET_AUTHOR: &str = r#"SELECT id, name, bio, mood FROM authors WHERE id = ?"#;

/// `:one` query `GetAuthor`
pub struct GetAuthorQuery<'a> {
    executor: &'a dyn rt::QueryExecutor,
}

impl<'a> GetAuthorQuery<'a> {
    pub fn new(executor: &'a dyn rt::QueryExecutor) -> Self {
        Self { executor }
    }

    pub async fn eval(&self, id: i64) -> rt::Result<Author> {
        let row = self.executor.query_row(GET_AUTHOR, &[id.to_sql()]).await?;
        Author::from_row(&row)
    }
}

pub const LIST_AUTHORS: &str = r#"SELECT id, name, bio, mood FROM authors ORDER BY id"#;

/// `:many` query `ListAuthors`
pub struct ListAuthorsQuery<'a> {
    executor: &'a dyn rt::QueryExecutor,
}

impl<'a> ListAuthorsQuery<'a> {
    pub fn new(executor: &'a dyn rt::QueryExecutor) -> Self {
        Self { executor }
    }

    pub async fn eval(&self) -> rt::Result<::std::vec::Vec<Author>> {
        let rows = self.executor.query(LIST_AUTHORS, &[]).await?;
        rows.iter().map(Author::from_row).collect()
    }
}

pub const DELETE_AUTHOR: &str = r#"DELETE FROM authors WHERE id = ?"#;

/// `:exec` query `DeleteAuthor`
pub struct DeleteAuthorQuery<'a> {
    executor: &'a dyn rt::QueryExecutor,
}

impl<'a> DeleteAuthorQuery<'a> {
    pub fn new(executor: &'a dyn rt::QueryExecutor) -> Self {
        Self { executor }
    }

    pub async fn eval(&self, id: i64) -> rt::Result<()> {
        self.executor.execute(DELETE_AUTHOR, &[id.to_sql()]).await?;
        Ok(())
    }
}

pub const UPDATE_AUTHOR_BIO: &str = r#"UPDATE authors SET bio = ? WHERE id = ?"#;

/// `:execrows` query `UpdateAuthorBio`
pub struct UpdateAuthorBioQuery<'a> {
    executor: &'a dyn rt::QueryExecutor,
}

impl<'a> UpdateAuthorBioQuery<'a> {
    pub fn new(executor: &'a dyn rt::QueryExecutor) -> Self {
        Self { executor }
    }

    pub async fn eval(&self, params: UpdateAuthorBioParams) -> rt::Result<u64> {
        let result = self.executor.execute(UPDATE_AUTHOR_BIO, &[params.bio.to_sql(), params.id.to_sql()]).await?;
        Ok(result.rows_affected())
    }
}

pub const CLEAR_BIOS: &str = r#"UPDATE authors SET bio = NULL"#;

/// `:execresult` query `ClearBios`
pub struct ClearBiosQuery<'a> {
    executor: &'a dyn rt::QueryExecutor,
}

impl<'a> ClearBiosQuery<'a> {
    pub fn new(executor: &'a dyn rt::QueryExecutor) -> Self {
        Self { executor }
    }

    pub async fn eval(&self) -> rt::Result<rt::ExecResult> {
        self.executor.execute(CLEAR_BIOS, &[]).await
    }
}

pub const CREATE_AUTHOR: &str = r#"INSERT INTO authors (name, mood) VALUES (?, ?)"#;

/// `:execlastid` query `CreateAuthor`
pub struct CreateAuthorQuery<'a> {
    executor: &'a dyn rt::QueryExecutor,
}

impl<'a> CreateAuthorQuery<'a> {
    pub fn new(executor: &'a dyn rt::QueryExecutor) -> Self {
        Self { executor }
    }

    pub async fn eval(&self, params: CreateAuthorParams) -> rt::Result<i64> {
        let result = self.executor.execute(CREATE_AUTHOR, &[params.name.to_sql(), params.mood.to_sql()]).await?;
        result
            .last_insert_id()
            .ok_or_else(|| rt::Error::unsupported("backend did not report a last insert id"))
    }
}

pub const CREATE_AUTHORS: &str = r#"INSERT INTO authors (name) VALUES (?)"#;

/// `:batchexec` query `CreateAuthors`
pub struct CreateAuthorsQuery<'a> {
    executor: &'a dyn rt::QueryExecutor,
}

impl<'a> CreateAuthorsQuery<'a> {
    pub fn new(executor: &'a dyn rt::QueryExecutor) -> Self {
        Self { executor }
    }

    pub async fn eval(&self, items: ::std::vec::Vec<::std::string::String>) -> rt::Result<rt::BatchResults<()>> {
        let items: ::std::vec::Vec<::std::vec::Vec<rt::SqlValue>> = items
            .into_iter()
            .map(|item| vec![item.to_sql()])
            .collect();
        let replies = self.executor.send_batch(CREATE_AUTHORS, rt::BatchMode::Exec, items).await?;
        Ok(rt::BatchResults::from_replies(replies, rt::BatchReply::into_exec))
    }
}

pub const GET_AUTHOR_NAME: &str = r#"SELECT name FROM authors WHERE id = ?"#;

/// `:batchone` query `GetAuthorName`
pub struct GetAuthorNameQuery<'a> {
    executor: &'a dyn rt::QueryExecutor,
}

impl<'a> GetAuthorNameQuery<'a> {
    pub fn new(executor: &'a dyn rt::QueryExecutor) -> Self {
        Self { executor }
    }

    pub async fn eval(&self, items: ::std::vec::Vec<i64>) -> rt::Result<rt::BatchResults<::std::string::String>> {
        let items: ::std::vec::Vec<::std::vec::Vec<rt::SqlValue>> = items
            .into_iter()
            .map(|item| vec![item.to_sql()])
            .collect();
        let replies = self.executor.send_batch(GET_AUTHOR_NAME, rt::BatchMode::QueryRow, items).await?;
        Ok(rt::BatchResults::from_replies(replies, |reply| reply.into_row().and_then(|row| rt::decode_scalar::<::std::string::String>(&row))))
    }
}

pub const LIST_AUTHORS_BY_MOOD: &str = r#"SELECT id, name FROM authors WHERE mood = ? ORDER BY id"#;

/// `:batchmany` query `ListAuthorsByMood`
pub struct ListAuthorsByMoodQuery<'a> {
    executor: &'a dyn rt::QueryExecutor,
}

impl<'a> ListAuthorsByMoodQuery<'a> {
    pub fn new(executor: &'a dyn rt::QueryExecutor) -> Self {
        Self { executor }
    }

    pub async fn eval(&self, items: ::std::vec::Vec<Mood>) -> rt::Result<rt::BatchResults<::std::vec::Vec<ListAuthorsByMoodRow>>> {
        let items: ::std::vec::Vec<::std::vec::Vec<rt::SqlValue>> = items
            .into_iter()
            .map(|item| vec![item.to_sql()])
            .collect();
        let replies = self.executor.send_batch(LIST_AUTHORS_BY_MOOD, rt::BatchMode::Query, items).await?;
        Ok(rt::BatchResults::from_replies(replies, |reply| reply.into_rows().and_then(|rows| rows.iter().map(ListAuthorsByMoodRow::from_row).collect())))
    }
}

/// `:copyfrom` query `LoadAuthors`
pub struct LoadAuthorsQuery<'a> {
    executor: &'a dyn rt::QueryExecutor,
}

impl<'a> LoadAuthorsQuery<'a> {
    pub fn new(executor: &'a dyn rt::QueryExecutor) -> Self {
        Self { executor }
    }

    pub async fn eval(&self, rows: ::std::vec::Vec<LoadAuthorsParams>) -> rt::Result<u64> {
        let rows: ::std::vec::Vec<::std::vec::Vec<rt::SqlValue>> = rows
            .into_iter()
            .map(|row| vec![row.name.to_sql(), row.bio.to_sql()])
            .collect();
        self.executor
            .copy_from("authors", &["name", "bio"], rows)
            .await
            .into_result()
    }
}
