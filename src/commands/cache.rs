use crate::eval::Gate;

pub fn email_cache_info(gate: &Gate) -> String {
    let stats = gate.identity().stats();
    format!(
        "Email Lookup Cache Info\nHits: {}\nMisses: {}\nMax Size {}\nCurrent Size: {}",
        stats.hits, stats.misses, stats.capacity, stats.size
    )
}

pub fn email_cache_clear(gate: &Gate) -> String {
    gate.identity().clear();
    "Email Lookup Cache cleared".into()
}

pub fn preauth_cache_clear(gate: &Gate) -> String {
    gate.preauth().clear();
    "Preauth Cache cleared".into()
}
