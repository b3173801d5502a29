// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded application database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `posts`: post_id → serialized Post
//! - `post_time_index`: (!created_at_micros | post_id) → post_id
//! - `attestations`: attestation_id → serialized Attestation
//! - `attestation_time_index`: (!created_at_micros | attestation_id) → attestation_id
//! - `post_attestations`: (post_id | !created_at_micros | attestation_id) → attestation_id
//! - `users`: checksummed address → serialized User
//! - `gm_posts`: gm_post_id → serialized GmPost
//! - `gm_post_time_index`: (!created_at_micros | gm_post_id) → gm_post_id
//!
//! Inverted timestamps make a forward scan return newest entries first.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadOnlyTable, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::models::{
    Attestation, AttestationWithPost, GmPost, NewPost, Post, PostPatch, PostWithAttestations,
    User, WalletAddress,
};

// =============================================================================
// Table Definitions
// =============================================================================

const POSTS: TableDefinition<&str, &[u8]> = TableDefinition::new("posts");
const POST_TIME_INDEX: TableDefinition<&[u8], &str> = TableDefinition::new("post_time_index");

const ATTESTATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("attestations");
const ATTESTATION_TIME_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("attestation_time_index");

/// Per-post index. Key format: `post_id|!timestamp_be|attestation_id`.
const POST_ATTESTATIONS: TableDefinition<&[u8], &str> = TableDefinition::new("post_attestations");

const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

const GM_POSTS: TableDefinition<&str, &[u8]> = TableDefinition::new("gm_posts");
const GM_POST_TIME_INDEX: TableDefinition<&[u8], &str> = TableDefinition::new("gm_post_time_index");

type IndexTable = ReadOnlyTable<&'static [u8], &'static str>;
type RecordTable = ReadOnlyTable<&'static str, &'static [u8]>;

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Big-endian inverted microsecond timestamp (newest sorts first).
fn inverted_time(at: DateTime<Utc>) -> [u8; 8] {
    (!(at.timestamp_micros() as u64)).to_be_bytes()
}

/// Key for the global time indexes: `!timestamp_be | id`.
fn make_time_key(at: DateTime<Utc>, id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + id.len());
    key.extend_from_slice(&inverted_time(at));
    key.extend_from_slice(id.as_bytes());
    key
}

/// Key for the per-post attestation index: `post_id | !timestamp_be | attestation_id`.
fn make_post_attestation_key(post_id: &str, at: DateTime<Utc>, attestation_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(post_id.len() + 1 + 8 + attestation_id.len());
    key.extend_from_slice(post_id.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&inverted_time(at));
    key.extend_from_slice(attestation_id.as_bytes());
    key
}

/// Half-open range covering every key that starts with `post_id|`.
fn post_prefix_range(post_id: &str) -> (Vec<u8>, Vec<u8>) {
    let mut start = post_id.as_bytes().to_vec();
    let mut end = start.clone();
    start.push(b'|');
    end.push(b'|' + 1);
    (start, end)
}

fn encode<T: Serialize>(value: &T) -> DbResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> DbResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

// =============================================================================
// AppDatabase
// =============================================================================

/// Embedded ACID store for posts, attestations, users and gm posts.
pub struct AppDatabase {
    db: Database,
}

impl AppDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(POSTS)?;
            let _ = write_txn.open_table(POST_TIME_INDEX)?;
            let _ = write_txn.open_table(ATTESTATIONS)?;
            let _ = write_txn.open_table(ATTESTATION_TIME_INDEX)?;
            let _ = write_txn.open_table(POST_ATTESTATIONS)?;
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(GM_POSTS)?;
            let _ = write_txn.open_table(GM_POST_TIME_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Cheap read used by the readiness probe.
    pub fn health_check(&self) -> DbResult<()> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(POSTS)?;
        let _ = table.first()?;
        Ok(())
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Create a post with a fresh UUID and the current time.
    pub fn create_post(&self, new: NewPost) -> DbResult<Post> {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            content: new.content,
            media_url: new.media_url,
            author: new.author,
            collaborators: Vec::new(),
            attesters: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.insert_post(&post)?;
        Ok(post)
    }

    pub(crate) fn insert_post(&self, post: &Post) -> DbResult<()> {
        let json = encode(post)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut posts = write_txn.open_table(POSTS)?;
            if posts.get(post.id.as_str())?.is_some() {
                return Err(DbError::AlreadyExists(format!("Post {}", post.id)));
            }
            posts.insert(post.id.as_str(), json.as_slice())?;

            let mut idx = write_txn.open_table(POST_TIME_INDEX)?;
            let key = make_time_key(post.created_at, &post.id);
            idx.insert(key.as_slice(), post.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// All posts, newest first, each with its attestations newest first.
    pub fn list_posts(&self) -> DbResult<Vec<PostWithAttestations>> {
        let read_txn = self.db.begin_read()?;
        let idx = read_txn.open_table(POST_TIME_INDEX)?;
        let posts = read_txn.open_table(POSTS)?;
        let post_atts = read_txn.open_table(POST_ATTESTATIONS)?;
        let atts = read_txn.open_table(ATTESTATIONS)?;

        let mut results = Vec::new();
        for entry in idx.iter()? {
            let (_, id) = entry?;
            let Some(value) = posts.get(id.value())? else {
                tracing::warn!(post_id = id.value(), "Time index points at a missing post");
                continue;
            };
            let post: Post = decode(value.value())?;
            let attestations = attestations_for_post(&post_atts, &atts, &post.id)?;
            results.push(PostWithAttestations { post, attestations });
        }
        Ok(results)
    }

    /// One post with its attestations newest first.
    pub fn get_post(&self, id: &str) -> DbResult<PostWithAttestations> {
        let read_txn = self.db.begin_read()?;
        let posts = read_txn.open_table(POSTS)?;
        let post: Post = match posts.get(id)? {
            Some(value) => decode(value.value())?,
            None => return Err(DbError::NotFound(format!("Post {id}"))),
        };

        let post_atts = read_txn.open_table(POST_ATTESTATIONS)?;
        let atts = read_txn.open_table(ATTESTATIONS)?;
        let attestations = attestations_for_post(&post_atts, &atts, id)?;
        Ok(PostWithAttestations { post, attestations })
    }

    /// Apply a partial update. Collaborators are appended, skipping ones already present.
    pub fn update_post(&self, id: &str, patch: PostPatch) -> DbResult<Post> {
        let write_txn = self.db.begin_write()?;
        let post = {
            let mut posts = write_txn.open_table(POSTS)?;

            // Read existing value and deserialize before mutating
            let existing_bytes = {
                let existing = posts
                    .get(id)?
                    .ok_or_else(|| DbError::NotFound(format!("Post {id}")))?;
                existing.value().to_vec()
            };

            let mut post: Post = decode(&existing_bytes)?;
            if let Some(title) = patch.title {
                post.title = title;
            }
            if let Some(content) = patch.content {
                post.content = content;
            }
            if let Some(media_url) = patch.media_url {
                post.media_url = media_url;
            }
            for collaborator in patch.collaborators {
                if !post.collaborators.contains(&collaborator) {
                    post.collaborators.push(collaborator);
                }
            }
            post.updated_at = Utc::now();

            let json = encode(&post)?;
            posts.insert(id, json.as_slice())?;
            post
        };
        write_txn.commit()?;
        Ok(post)
    }

    // =========================================================================
    // Attestations
    // =========================================================================

    /// Record an attestation and append its attester to the post, atomically.
    ///
    /// Fails with `NotFound` if the post does not exist and with
    /// `AlreadyExists` if the attestation id was recorded before. Returns the
    /// updated post with its attestations.
    pub fn create_attestation(&self, attestation: &Attestation) -> DbResult<PostWithAttestations> {
        let post_id = attestation.post_id.as_str();
        let write_txn = self.db.begin_write()?;
        {
            let mut posts = write_txn.open_table(POSTS)?;
            let existing_bytes = {
                let existing = posts
                    .get(post_id)?
                    .ok_or_else(|| DbError::NotFound(format!("Post {post_id}")))?;
                existing.value().to_vec()
            };

            let mut atts = write_txn.open_table(ATTESTATIONS)?;
            if atts.get(attestation.id.as_str())?.is_some() {
                return Err(DbError::AlreadyExists(format!(
                    "Attestation {}",
                    attestation.id
                )));
            }
            let json = encode(attestation)?;
            atts.insert(attestation.id.as_str(), json.as_slice())?;

            let mut time_idx = write_txn.open_table(ATTESTATION_TIME_INDEX)?;
            let key = make_time_key(attestation.created_at, &attestation.id);
            time_idx.insert(key.as_slice(), attestation.id.as_str())?;

            let mut post_idx = write_txn.open_table(POST_ATTESTATIONS)?;
            let key = make_post_attestation_key(post_id, attestation.created_at, &attestation.id);
            post_idx.insert(key.as_slice(), attestation.id.as_str())?;

            let mut post: Post = decode(&existing_bytes)?;
            post.attesters.push(attestation.attester.clone());
            post.updated_at = Utc::now();
            let json = encode(&post)?;
            posts.insert(post_id, json.as_slice())?;
        }
        // Dropping an uncommitted write transaction aborts it.
        write_txn.commit()?;

        self.get_post(post_id)
    }

    /// All attestations, newest first, each with its post.
    pub fn list_attestations(&self) -> DbResult<Vec<AttestationWithPost>> {
        let read_txn = self.db.begin_read()?;
        let idx = read_txn.open_table(ATTESTATION_TIME_INDEX)?;
        let atts = read_txn.open_table(ATTESTATIONS)?;
        let posts = read_txn.open_table(POSTS)?;

        let mut results = Vec::new();
        for entry in idx.iter()? {
            let (_, id) = entry?;
            let Some(value) = atts.get(id.value())? else {
                continue;
            };
            let attestation: Attestation = decode(value.value())?;
            let Some(post_value) = posts.get(attestation.post_id.as_str())? else {
                tracing::warn!(
                    attestation_id = %attestation.id,
                    post_id = %attestation.post_id,
                    "Attestation references a missing post"
                );
                continue;
            };
            let post: Post = decode(post_value.value())?;
            results.push(AttestationWithPost { attestation, post });
        }
        Ok(results)
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Return the user for `address`, creating it with `make_username` on first sign-in.
    ///
    /// The boolean is `true` when the user was created by this call.
    pub fn get_or_create_user<F>(
        &self,
        address: &WalletAddress,
        make_username: F,
    ) -> DbResult<(User, bool)>
    where
        F: FnOnce() -> String,
    {
        let write_txn = self.db.begin_write()?;
        let result = {
            let mut users = write_txn.open_table(USERS)?;
            let existing = match users.get(address.as_str())? {
                Some(value) => Some(decode::<User>(value.value())?),
                None => None,
            };
            match existing {
                Some(user) => (user, false),
                None => {
                    let user = User {
                        id: address.clone(),
                        username: make_username(),
                        created_at: Utc::now(),
                    };
                    let json = encode(&user)?;
                    users.insert(address.as_str(), json.as_slice())?;
                    (user, true)
                }
            }
        };
        write_txn.commit()?;
        Ok(result)
    }

    // =========================================================================
    // GmPosts
    // =========================================================================

    pub fn create_gm_post(&self, title: String, content: String, media_url: String) -> DbResult<GmPost> {
        let post = GmPost {
            id: Uuid::new_v4().to_string(),
            title,
            content,
            media_url,
            created_at: Utc::now(),
        };
        self.insert_gm_post(&post)?;
        Ok(post)
    }

    pub(crate) fn insert_gm_post(&self, post: &GmPost) -> DbResult<()> {
        let json = encode(post)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(GM_POSTS)?;
            table.insert(post.id.as_str(), json.as_slice())?;

            let mut idx = write_txn.open_table(GM_POST_TIME_INDEX)?;
            let key = make_time_key(post.created_at, &post.id);
            idx.insert(key.as_slice(), post.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// All gm posts, newest first.
    pub fn list_gm_posts(&self) -> DbResult<Vec<GmPost>> {
        let read_txn = self.db.begin_read()?;
        let idx = read_txn.open_table(GM_POST_TIME_INDEX)?;
        let table = read_txn.open_table(GM_POSTS)?;

        let mut results = Vec::new();
        for entry in idx.iter()? {
            let (_, id) = entry?;
            if let Some(value) = table.get(id.value())? {
                results.push(decode(value.value())?);
            }
        }
        Ok(results)
    }
}

/// Attestations of one post, newest first.
fn attestations_for_post(
    post_atts: &IndexTable,
    atts: &RecordTable,
    post_id: &str,
) -> DbResult<Vec<Attestation>> {
    let (start, end) = post_prefix_range(post_id);
    let mut results = Vec::new();
    for entry in post_atts.range(start.as_slice()..end.as_slice())? {
        let (_, attestation_id) = entry?;
        if let Some(value) = atts.get(attestation_id.value())? {
            results.push(decode(value.value())?);
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Emotion;
    use alloy::primitives::Address;
    use chrono::Duration;

    fn open_db() -> (tempfile::TempDir, AppDatabase) {
        let dir = tempfile::tempdir().unwrap();
        let db = AppDatabase::open(&dir.path().join("test.redb")).unwrap();
        (dir, db)
    }

    fn addr(byte: u8) -> WalletAddress {
        WalletAddress::from(Address::repeat_byte(byte))
    }

    fn post_at(id: &str, created_at: DateTime<Utc>) -> Post {
        Post {
            id: id.to_string(),
            title: format!("title {id}"),
            content: "content".to_string(),
            media_url: format!("https://cdn.example/{id}.mp4"),
            author: addr(1),
            collaborators: vec![],
            attesters: vec![],
            created_at,
            updated_at: created_at,
        }
    }

    fn attestation(id: &str, post_id: &str, attester: u8, created_at: DateTime<Utc>) -> Attestation {
        Attestation {
            id: id.to_string(),
            tx_id: format!("tx-{id}"),
            chain: "OPTIMISM_MAINNET".to_string(),
            schema_id: "0xschema".to_string(),
            attester: addr(attester),
            recipient: addr(1),
            emotion: Emotion::Care,
            impact: 4,
            attester_role: "audience".to_string(),
            category: "IMPACT_REPORT".to_string(),
            post_id: post_id.to_string(),
            created_at,
        }
    }

    #[test]
    fn create_and_get_post() {
        let (_dir, db) = open_db();
        let post = db
            .create_post(NewPost {
                title: "gm".into(),
                content: "first".into(),
                media_url: "https://cdn.example/a.mp4".into(),
                author: addr(7),
            })
            .unwrap();

        let fetched = db.get_post(&post.id).unwrap();
        assert_eq!(fetched.post, post);
        assert!(fetched.attestations.is_empty());
    }

    #[test]
    fn get_missing_post_is_not_found() {
        let (_dir, db) = open_db();
        assert!(matches!(db.get_post("nope"), Err(DbError::NotFound(_))));
    }

    #[test]
    fn posts_are_listed_newest_first() {
        let (_dir, db) = open_db();
        let base = Utc::now();
        db.insert_post(&post_at("old", base - Duration::hours(2))).unwrap();
        db.insert_post(&post_at("new", base)).unwrap();
        db.insert_post(&post_at("mid", base - Duration::hours(1))).unwrap();

        let ids: Vec<String> = db
            .list_posts()
            .unwrap()
            .into_iter()
            .map(|p| p.post.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn attestation_appends_attester_and_orders_newest_first() {
        let (_dir, db) = open_db();
        let base = Utc::now();
        db.insert_post(&post_at("p1", base - Duration::hours(1))).unwrap();

        db.create_attestation(&attestation("0xa1", "p1", 2, base - Duration::minutes(5)))
            .unwrap();
        let updated = db
            .create_attestation(&attestation("0xa2", "p1", 3, base))
            .unwrap();

        assert_eq!(updated.post.attesters, vec![addr(2), addr(3)]);
        let ids: Vec<&str> = updated.attestations.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["0xa2", "0xa1"]);
    }

    #[test]
    fn duplicate_attestation_is_rejected_without_side_effects() {
        let (_dir, db) = open_db();
        let now = Utc::now();
        db.insert_post(&post_at("p1", now)).unwrap();
        db.create_attestation(&attestation("0xa1", "p1", 2, now)).unwrap();

        let err = db
            .create_attestation(&attestation("0xa1", "p1", 3, now))
            .unwrap_err();
        assert!(matches!(err, DbError::AlreadyExists(_)));

        let post = db.get_post("p1").unwrap();
        assert_eq!(post.post.attesters, vec![addr(2)]);
        assert_eq!(post.attestations.len(), 1);
    }

    #[test]
    fn attestation_for_missing_post_is_not_found() {
        let (_dir, db) = open_db();
        let err = db
            .create_attestation(&attestation("0xa1", "ghost", 2, Utc::now()))
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
        assert!(db.list_attestations().unwrap().is_empty());
    }

    #[test]
    fn attestations_of_neighbouring_posts_do_not_mix() {
        let (_dir, db) = open_db();
        let now = Utc::now();
        db.insert_post(&post_at("p1", now)).unwrap();
        db.insert_post(&post_at("p10", now)).unwrap();
        db.create_attestation(&attestation("0xa1", "p1", 2, now)).unwrap();
        db.create_attestation(&attestation("0xb1", "p10", 2, now)).unwrap();

        let p1 = db.get_post("p1").unwrap();
        assert_eq!(p1.attestations.len(), 1);
        assert_eq!(p1.attestations[0].id, "0xa1");
    }

    #[test]
    fn list_attestations_embeds_post() {
        let (_dir, db) = open_db();
        let base = Utc::now();
        db.insert_post(&post_at("p1", base)).unwrap();
        db.create_attestation(&attestation("0xa1", "p1", 2, base - Duration::seconds(30)))
            .unwrap();
        db.create_attestation(&attestation("0xa2", "p1", 3, base)).unwrap();

        let list = db.list_attestations().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].attestation.id, "0xa2");
        assert_eq!(list[0].post.id, "p1");
    }

    #[test]
    fn update_post_patches_fields_and_appends_collaborators() {
        let (_dir, db) = open_db();
        db.insert_post(&post_at("p1", Utc::now())).unwrap();

        let patched = db
            .update_post(
                "p1",
                PostPatch {
                    title: Some("renamed".into()),
                    collaborators: vec![addr(9), addr(9)],
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(patched.title, "renamed");
        assert_eq!(patched.collaborators, vec![addr(9)]);

        let again = db
            .update_post(
                "p1",
                PostPatch {
                    collaborators: vec![addr(9), addr(8)],
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(again.collaborators, vec![addr(9), addr(8)]);
        assert_eq!(again.content, "content");

        assert!(matches!(
            db.update_post("ghost", PostPatch::default()),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn get_or_create_user_is_idempotent() {
        let (_dir, db) = open_db();
        let (user, created) = db
            .get_or_create_user(&addr(5), || "braveOtterCalm".to_string())
            .unwrap();
        assert!(created);
        assert_eq!(user.username, "braveOtterCalm");

        let (again, created) = db
            .get_or_create_user(&addr(5), || "other".to_string())
            .unwrap();
        assert!(!created);
        assert_eq!(again, user);

        let (other, created) = db
            .get_or_create_user(&addr(6), || "quietFoxBold".to_string())
            .unwrap();
        assert!(created);
        assert_eq!(other.username, "quietFoxBold");
    }

    #[test]
    fn gm_posts_round_trip() {
        let (_dir, db) = open_db();
        let first = db
            .create_gm_post("a".into(), "b".into(), "https://cdn/1.mp4".into())
            .unwrap();
        let list = db.list_gm_posts().unwrap();
        assert_eq!(list, vec![first]);
        db.health_check().unwrap();
    }
}
