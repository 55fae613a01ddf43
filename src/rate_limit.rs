/// Usage counters for one quota tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierUsage {
    pub used: u32,
    pub limit: u32,
}

impl TierUsage {
    pub fn new(used: u32, limit: u32) -> Self {
        Self { used, limit }
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }

    pub fn exhausted(&self) -> bool {
        self.limit > 0 && self.used >= self.limit
    }
}

/// The tier whose message the presentation layer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitTier {
    Global,
    PerClient,
    Session,
}

/// Three-tier quota state. Precedence is fixed: the global flag dominates,
/// then the per-client tier if it has materialized, then the session tier.
/// The global flag persists until a subsequent successful generation.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    session: TierUsage,
    client: Option<TierUsage>,
    global_reached: bool,
    retry_after_secs: Option<u64>,
    default_client_limit: u32,
}

impl RateLimitState {
    pub fn new(session_limit: u32, default_client_limit: u32) -> Self {
        Self {
            session: TierUsage::new(0, session_limit),
            client: None,
            global_reached: false,
            retry_after_secs: None,
            default_client_limit,
        }
    }

    pub fn active_tier(&self) -> LimitTier {
        if self.global_reached {
            LimitTier::Global
        } else if self.client.is_some() {
            LimitTier::PerClient
        } else {
            LimitTier::Session
        }
    }

    pub fn session(&self) -> TierUsage {
        self.session
    }

    pub fn client(&self) -> Option<TierUsage> {
        self.client
    }

    pub fn global_reached(&self) -> bool {
        self.global_reached
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after_secs
    }

    pub fn is_blocked(&self) -> bool {
        self.global_reached
            || self.client.map(|tier| tier.exhausted()).unwrap_or(false)
            || self.session.exhausted()
    }

    /// Merge the quota block of a successful response. Supplied fields
    /// overwrite, everything else keeps its prior value. The per-client tier
    /// only materializes once the session tier is exhausted; its limit stays
    /// at the last known value until a limit failure supplies one.
    pub fn merge_quota(&mut self, remaining: u32, limit: u32, ip_used: Option<u32>) {
        self.session.limit = limit;
        self.session.used = limit.saturating_sub(remaining);
        if let Some(ip_used) = ip_used {
            if self.session.exhausted() || self.client.is_some() {
                let client_limit =
                    self.client.map(|tier| tier.limit).unwrap_or(self.default_client_limit);
                self.client = Some(TierUsage::new(ip_used, client_limit));
            }
        }
    }

    /// An `IP_LIMIT_REACHED` rejection: the tier is fully exhausted, so both
    /// counters take the reported limit (falling back to the configured
    /// default when the response omits it).
    pub fn note_client_exhausted(&mut self, limit: Option<u32>, retry_after_secs: Option<u64>) {
        let limit = limit.unwrap_or(self.default_client_limit);
        self.client = Some(TierUsage::new(limit, limit));
        if retry_after_secs.is_some() {
            self.retry_after_secs = retry_after_secs;
        }
    }

    pub fn note_global_reached(&mut self, retry_after_secs: Option<u64>) {
        self.global_reached = true;
        if retry_after_secs.is_some() {
            self.retry_after_secs = retry_after_secs;
        }
    }

    /// One accepted request: bump session usage and lift the global flag.
    pub fn note_success(&mut self) {
        self.session.used = self.session.used.saturating_add(1);
        self.global_reached = false;
        self.retry_after_secs = None;
    }
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self::new(5, 15)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_order_is_global_then_client_then_session() {
        let mut limits = RateLimitState::default();
        assert_eq!(limits.active_tier(), LimitTier::Session);
        limits.note_client_exhausted(Some(15), None);
        assert_eq!(limits.active_tier(), LimitTier::PerClient);
        limits.note_global_reached(Some(3600));
        assert_eq!(limits.active_tier(), LimitTier::Global);
    }

    #[test]
    fn client_exhaustion_sets_both_counters_to_limit() {
        let mut limits = RateLimitState::default();
        limits.note_client_exhausted(Some(15), Some(600));
        let client = limits.client().expect("client tier");
        assert_eq!(client.used, 15);
        assert_eq!(client.limit, 15);
        assert_eq!(limits.retry_after_secs(), Some(600));
    }

    #[test]
    fn global_flag_persists_until_success() {
        let mut limits = RateLimitState::default();
        limits.note_global_reached(Some(120));
        assert!(limits.global_reached());
        limits.merge_quota(3, 5, None);
        assert!(limits.global_reached());
        limits.note_success();
        assert!(!limits.global_reached());
        assert_eq!(limits.retry_after_secs(), None);
    }

    #[test]
    fn client_tier_materializes_only_after_session_exhaustion() {
        let mut limits = RateLimitState::default();
        limits.merge_quota(2, 5, Some(7));
        assert!(limits.client().is_none());
        limits.merge_quota(0, 5, Some(9));
        let client = limits.client().expect("client tier");
        assert_eq!(client.used, 9);
        assert_eq!(client.limit, 15);
    }

    #[test]
    fn quota_merge_is_idempotent() {
        let mut limits = RateLimitState::default();
        limits.merge_quota(1, 5, None);
        limits.merge_quota(1, 5, None);
        assert_eq!(limits.session(), TierUsage::new(4, 5));
    }

    #[test]
    fn success_accounting_increments_once() {
        let mut limits = RateLimitState::new(2, 15);
        limits.note_success();
        assert_eq!(limits.session().used, 1);
        assert!(!limits.is_blocked());
        limits.note_success();
        assert!(limits.session().exhausted());
        assert!(limits.is_blocked());
    }
}
