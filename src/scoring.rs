use sha2::{Digest, Sha256};

use crate::requests::OnlineScoreArgs;
use crate::store::KvStore;

/// Scores live in the store for one hour.
pub const SCORE_TTL_SECS: u64 = 3600;

/// Deterministic cache key for a score computation.
///
/// Concatenates first name, last name, phone and birthday in that fixed
/// order (absent fields contribute an empty string) and digests the result;
/// requests describing the same person share a key.
pub fn score_cache_key(args: &OnlineScoreArgs) -> String {
    let mut hasher = Sha256::new();
    hasher.update(args.first_name.as_deref().unwrap_or(""));
    hasher.update(args.last_name.as_deref().unwrap_or(""));
    hasher.update(args.phone.as_deref().unwrap_or(""));
    if let Some(birthday) = args.birthday {
        hasher.update(birthday.format("%Y%m%d").to_string());
    }
    format!("uid:{}", hex::encode(hasher.finalize()))
}

/// Computes the score for validated online-score arguments, memoized
/// through the store.
///
/// A cached value of exactly zero is treated as a miss: under the
/// "non-zero means hit" scheme a genuinely zero score is never served from
/// the store and is always recomputed. Kept as-is from the historical
/// behavior rather than silently changed.
pub async fn get_score(store: &dyn KvStore, args: &OnlineScoreArgs) -> f64 {
    let key = score_cache_key(args);

    if let Some(cached) = store.cache_get(&key).await {
        if cached != 0.0 {
            tracing::debug!("Score cache hit for {}", key);
            return cached;
        }
    }

    let mut score = 0.0;
    if args.phone.is_some() {
        score += 1.5;
    }
    if args.email.is_some() {
        score += 1.5;
    }
    if args.birthday.is_some() && args.gender.is_some() {
        score += 1.5;
    }
    if args.first_name.is_some() && args.last_name.is_some() {
        score += 0.5;
    }

    if !store.cache_set(&key, score, SCORE_TTL_SECS).await {
        // Degraded store: serve the fresh computation and move on.
        tracing::debug!("Score cache write for {} not acknowledged", key);
    }

    score
}

/// Looks up the topic interests of a client.
///
/// A missing key, an unreachable store or an undecodable payload all yield
/// an empty list; the request as a whole never fails on this path.
pub async fn get_interests(store: &dyn KvStore, client_id: i64) -> Vec<String> {
    let key = format!("i:{}", client_id);
    let Some(raw) = store.get(&key).await else {
        return Vec::new();
    };
    match serde_json::from_str(&raw) {
        Ok(interests) => interests,
        Err(e) => {
            tracing::warn!("Undecodable interests under {}: {}", key, e);
            Vec::new()
        }
    }
}
