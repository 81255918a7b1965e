use crate::common::defs::SESSION_ID_LEN;
use crate::config::SessionParams;
use crate::Result;
use rand::distributions::Uniform;
use rand::Rng;
use url::Url;

/// Picks the session id for a new episode: an explicitly assigned session wins,
/// then a seed-derived one, then a random lowercase id.
pub fn resolve_session_id(assigned: Option<&str>, seed: Option<u64>) -> String {
    if let Some(session) = assigned {
        return session.to_string();
    }

    match seed {
        Some(seed) => format!("fixed_{seed}"),
        None => random_session_id(&mut rand::thread_rng()),
    }
}

pub fn random_session_id<R: Rng>(rng: &mut R) -> String {
    rng.sample_iter(Uniform::new_inclusive(b'a', b'z'))
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

/// Url that starts an episode for `session_id` on the shop at `base_url`.
pub fn session_url(base_url: &str, session_id: &str, params: &SessionParams) -> Result<Url> {
    let mut url = Url::parse(base_url)?.join(&format!("/{session_id}"))?;

    let pairs = params.query_pairs();
    if !pairs.is_empty() {
        let mut query = url.query_pairs_mut();
        for (k, v) in &pairs {
            query.append_pair(k, v);
        }
    }

    Ok(url)
}
