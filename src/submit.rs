use crate::api::TcBackend;
use crate::error::{ApiError, ConsoleError};
use crate::model::{Filter, PageVariant, Strategy, StrategyKind, StrategyPair};
use crate::prefs::{PreferenceStore, Preferences, StoreError};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// Pause after a response before the flow accepts the next submit.
pub const SETTLE_DELAY: Duration = Duration::from_millis(300);

const FIRST_KEYS: StrategyKeys = StrategyKeys {
    strategy: "strategy",
    loss: "loss",
    delay: "delay",
    rate: "rate",
    jitter: "delayDistro",
};

const SECOND_KEYS: StrategyKeys = StrategyKeys {
    strategy: "strategy2",
    loss: "loss2",
    delay: "delay2",
    rate: "rate2",
    jitter: "delayDistro2",
};

struct StrategyKeys {
    strategy: &'static str,
    loss: &'static str,
    delay: &'static str,
    rate: &'static str,
    jitter: &'static str,
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Select an interface")]
    MissingIface,

    #[error("Select a protocol")]
    MissingProtocol,

    #[error("Enter the {0} to match")]
    MissingIdentifyValue(&'static str),

    #[error("Select a strategy")]
    NoStrategy,

    #[error("Duplicate strategy {0}")]
    DuplicateStrategy(&'static str),

    #[error("Delay jitter {0} is not a number")]
    InvalidJitter(String),

    #[error("Delay jitter {0} must not be negative")]
    NegativeJitter(String),

    #[error("Delay jitter {jitter} must not exceed delay {delay}")]
    JitterExceedsDelay { jitter: String, delay: u32 },
}

pub fn validate_filter(filter: &Filter) -> Result<(), ValidationError> {
    if filter.iface().is_none() {
        return Err(ValidationError::MissingIface);
    }
    if filter.protocol.is_none() {
        return Err(ValidationError::MissingProtocol);
    }
    match filter.identify_key {
        Some(key) if !key.needs_value() => Ok(()),
        key => {
            if filter.identify_value().is_none() {
                let label = key.map(|k| k.value_label()).unwrap_or("value");
                return Err(ValidationError::MissingIdentifyValue(label));
            }
            Ok(())
        }
    }
}

/// Jitter only matters for a delay strategy and must stay within the delay.
pub fn validate_jitter(strategy: &Strategy) -> Result<(), ValidationError> {
    if strategy.kind != Some(StrategyKind::Delay) {
        return Ok(());
    }
    let Some(raw) = strategy.delay_jitter() else {
        return Ok(());
    };
    let jitter = raw
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::InvalidJitter(raw.to_string()))?;
    if jitter < 0.0 {
        return Err(ValidationError::NegativeJitter(raw.to_string()));
    }
    let delay = strategy.delay.unwrap_or(0);
    if jitter > f64::from(delay) {
        return Err(ValidationError::JitterExceedsDelay {
            jitter: raw.to_string(),
            delay,
        });
    }
    Ok(())
}

pub fn validate_pair(pair: &StrategyPair) -> Result<(), ValidationError> {
    match (pair.first.kind, pair.second.kind) {
        (None, None) => return Err(ValidationError::NoStrategy),
        (Some(a), Some(b)) if a == b => return Err(ValidationError::DuplicateStrategy(a.as_str())),
        _ => {}
    }
    validate_jitter(&pair.first)?;
    validate_jitter(&pair.second)
}

pub fn validate_reset(iface: Option<&str>) -> Result<&str, ValidationError> {
    iface
        .map(str::trim)
        .filter(|i| !i.is_empty())
        .ok_or(ValidationError::MissingIface)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetupEndpoint {
    Setup,
    Setup2,
}

impl SetupEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            SetupEndpoint::Setup => "config/setup",
            SetupEndpoint::Setup2 => "config/setup2",
        }
    }
}

/// Query parameters for `config/setup` or `config/setup2`, in wire order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetupParams {
    endpoint: SetupEndpoint,
    pairs: Vec<(&'static str, String)>,
}

impl SetupParams {
    pub fn endpoint(&self) -> SetupEndpoint {
        self.endpoint
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn query_string(&self) -> String {
        let mut url = Url::parse("http://localhost/").expect("static url");
        url.query_pairs_mut()
            .extend_pairs(self.pairs.iter().map(|(k, v)| (*k, v.as_str())));
        url.query().unwrap_or_default().to_string()
    }
}

/// Maps a validated filter and one or two strategies to the backend's
/// parameter set. Unset fields and parameters of inactive kinds are left out.
pub fn build_setup_params(
    filter: &Filter,
    first: &Strategy,
    second: Option<&Strategy>,
    api_port: Option<u16>,
) -> SetupParams {
    let mut pairs = Vec::new();
    if let Some(iface) = filter.iface() {
        pairs.push(("iface", iface.to_string()));
    }
    if let Some(protocol) = filter.protocol {
        pairs.push(("protocol", protocol.as_str().to_string()));
    }
    if let Some(direction) = filter.direction {
        pairs.push(("direction", direction.as_str().to_string()));
    }
    if let Some(key) = filter.identify_key {
        pairs.push(("identifyKey", key.as_str().to_string()));
        if key.needs_value() {
            if let Some(value) = filter.identify_value() {
                pairs.push(("identifyValue", value.to_string()));
            }
        }
    }
    push_strategy(&mut pairs, first, &FIRST_KEYS);
    if let Some(second) = second {
        push_strategy(&mut pairs, second, &SECOND_KEYS);
    }
    if let Some(port) = api_port {
        pairs.push(("api", port.to_string()));
    }

    SetupParams {
        endpoint: if second.is_some() {
            SetupEndpoint::Setup2
        } else {
            SetupEndpoint::Setup
        },
        pairs,
    }
}

fn push_strategy(pairs: &mut Vec<(&'static str, String)>, strategy: &Strategy, keys: &StrategyKeys) {
    let Some(kind) = strategy.kind else {
        return;
    };
    pairs.push((keys.strategy, kind.as_str().to_string()));
    match kind {
        StrategyKind::Loss => {
            if let Some(loss) = strategy.loss {
                pairs.push((keys.loss, loss.to_string()));
            }
        }
        StrategyKind::Delay => {
            if let Some(delay) = strategy.delay {
                pairs.push((keys.delay, delay.to_string()));
            }
            if let Some(jitter) = strategy.delay_jitter() {
                pairs.push((keys.jitter, jitter.to_string()));
            }
        }
        StrategyKind::Rate => {
            if let Some(rate) = strategy.rate {
                pairs.push((keys.rate, rate.to_string()));
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SimpleForm {
    #[serde(default)]
    pub filter: Filter,
    #[serde(default)]
    pub strategy: Strategy,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CombinedForm {
    #[serde(default)]
    pub filter: Filter,
    pub strategies: StrategyPair,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SetupForm {
    Simple(SimpleForm),
    Combined(CombinedForm),
}

impl SetupForm {
    pub fn from_json(variant: PageVariant, body: Value) -> Result<Self, serde_json::Error> {
        Ok(match variant {
            PageVariant::Simple => SetupForm::Simple(serde_json::from_value(body)?),
            PageVariant::Combined => SetupForm::Combined(serde_json::from_value(body)?),
        })
    }

    pub fn variant(&self) -> PageVariant {
        match self {
            SetupForm::Simple(_) => PageVariant::Simple,
            SetupForm::Combined(_) => PageVariant::Combined,
        }
    }

    pub fn filter(&self) -> &Filter {
        match self {
            SetupForm::Simple(form) => &form.filter,
            SetupForm::Combined(form) => &form.filter,
        }
    }

    /// Kind distinctness is a combined-page rule only.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_filter(self.filter())?;
        match self {
            SetupForm::Simple(form) => validate_jitter(&form.strategy),
            SetupForm::Combined(form) => validate_pair(&form.strategies),
        }
    }

    pub fn params(&self, api_port: Option<u16>) -> SetupParams {
        match self {
            SetupForm::Simple(form) => {
                build_setup_params(&form.filter, &form.strategy, None, api_port)
            }
            SetupForm::Combined(form) => build_setup_params(
                &form.filter,
                &form.strategies.first,
                Some(&form.strategies.second),
                api_port,
            ),
        }
    }

    fn persist(&self, store: &dyn PreferenceStore) -> Result<(), StoreError> {
        let prefs = Preferences::new(store, self.variant());
        match self {
            SetupForm::Simple(form) => prefs.save(&form.filter, &form.strategy),
            SetupForm::Combined(form) => prefs.save(&form.filter, &form.strategies),
        }
    }

    // The file store writes synchronously, so saving runs on the blocking pool.
    async fn persist_blocking(&self, store: Arc<dyn PreferenceStore>) -> Result<(), StoreError> {
        let form = self.clone();
        tokio::task::spawn_blocking(move || form.persist(store.as_ref())).await?
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Validating,
    Submitting,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("another request is still running")]
    Busy,

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl From<SubmitError> for ConsoleError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Busy => ConsoleError::Busy,
            SubmitError::Invalid(err) => ConsoleError::Validation(err.to_string()),
        }
    }
}

/// Result of a submit that reached the backend. A backend failure still
/// counts as a completed submit: the refresh counter moved either way.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub refresh: u64,
    pub result: Result<Value, ApiError>,
}

/// `idle -> validating -> submitting -> idle` for one page variant.
pub struct SubmitFlow {
    state: Mutex<FlowState>,
    refresh: AtomicU64,
    settle: Duration,
}

struct FlowGuard<'a> {
    flow: &'a SubmitFlow,
}

impl FlowGuard<'_> {
    fn advance(&self, next: FlowState) {
        *self.flow.lock_state() = next;
    }
}

impl Drop for FlowGuard<'_> {
    fn drop(&mut self) {
        *self.flow.lock_state() = FlowState::Idle;
    }
}

impl Default for SubmitFlow {
    fn default() -> Self {
        Self::with_settle(SETTLE_DELAY)
    }
}

impl SubmitFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settle(settle: Duration) -> Self {
        Self {
            state: Mutex::new(FlowState::Idle),
            refresh: AtomicU64::new(0),
            settle,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> FlowState {
        *self.lock_state()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, FlowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> Result<FlowGuard<'_>, SubmitError> {
        let mut state = self.lock_state();
        if *state != FlowState::Idle {
            return Err(SubmitError::Busy);
        }
        *state = FlowState::Validating;
        Ok(FlowGuard { flow: self })
    }

    async fn finish(
        &self,
        guard: FlowGuard<'_>,
        result: Result<Value, ApiError>,
    ) -> SubmitOutcome {
        let refresh = self.refresh.fetch_add(1, Ordering::SeqCst) + 1;
        if let Err(err) = &result {
            tracing::warn!("Backend call failed: {err}");
        }
        tokio::time::sleep(self.settle).await;
        drop(guard);
        SubmitOutcome { refresh, result }
    }

    pub async fn setup<B: TcBackend>(
        &self,
        backend: &B,
        store: Arc<dyn PreferenceStore>,
        form: &SetupForm,
        api_port: Option<u16>,
    ) -> Result<SubmitOutcome, SubmitError> {
        let guard = self.begin()?;
        form.validate()?;

        guard.advance(FlowState::Submitting);
        if let Err(err) = form.persist_blocking(store).await {
            tracing::warn!("Unable to save {} preferences: {err}", form.variant().slug());
        }
        let params = form.params(api_port);
        tracing::info!(
            "Applying {} {}",
            params.endpoint().path(),
            params.query_string()
        );
        let result = backend.setup(&params).await;
        Ok(self.finish(guard, result).await)
    }

    pub async fn reset<B: TcBackend>(
        &self,
        backend: &B,
        iface: Option<&str>,
    ) -> Result<SubmitOutcome, SubmitError> {
        let guard = self.begin()?;
        let iface = validate_reset(iface)?;

        guard.advance(FlowState::Submitting);
        tracing::info!("Resetting traffic control on {iface}");
        let result = backend.reset(iface).await;
        Ok(self.finish(guard, result).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TcConfig;
    use crate::model::{Direction, IdentifyKey, Interface, Protocol};
    use crate::prefs::MemoryStore;
    use crate::scan::{ScanReport, ScanRequest};
    use serde_json::json;
    use std::time::Instant;

    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl FakeBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) -> Result<Value, ApiError> {
            self.calls.lock().unwrap().push(call.clone());
            if self.fail {
                return Err(ApiError::Backend {
                    url: call,
                    status: 200,
                    code: 100,
                    message: Some("tcset failed".into()),
                    body: String::new(),
                });
            }
            Ok(json!({"ok": true}))
        }
    }

    impl TcBackend for FakeBackend {
        async fn init(&self) -> Result<Vec<Interface>, ApiError> {
            Ok(Vec::new())
        }

        async fn scan(&self, _request: &ScanRequest) -> Result<ScanReport, ApiError> {
            Ok(ScanReport::default())
        }

        async fn query(&self, _iface: &str) -> Result<TcConfig, ApiError> {
            Ok(TcConfig::default())
        }

        async fn reset(&self, iface: &str) -> Result<Value, ApiError> {
            self.record(format!("config/reset?iface={iface}"))
        }

        async fn setup(&self, params: &SetupParams) -> Result<Value, ApiError> {
            self.record(format!(
                "{}?{}",
                params.endpoint().path(),
                params.query_string()
            ))
        }
    }

    fn eth0_all() -> Filter {
        Filter {
            iface: Some("eth0".into()),
            protocol: Some(Protocol::Ip),
            direction: None,
            identify_key: Some(IdentifyKey::All),
            identify_value: None,
        }
    }

    fn loss(value: u32) -> Strategy {
        Strategy {
            kind: Some(StrategyKind::Loss),
            loss: Some(value),
            delay: Some(100),
            rate: Some(500),
            delay_jitter: None,
        }
    }

    fn delay(value: u32, jitter: Option<&str>) -> Strategy {
        Strategy {
            kind: Some(StrategyKind::Delay),
            delay: Some(value),
            delay_jitter: jitter.map(Into::into),
            ..Strategy::default()
        }
    }

    fn combined(first: Strategy, second: Strategy) -> SetupForm {
        SetupForm::Combined(CombinedForm {
            filter: eth0_all(),
            strategies: StrategyPair { first, second },
        })
    }

    #[test]
    fn identify_all_needs_no_value() {
        assert_eq!(validate_filter(&eth0_all()), Ok(()));
        let mut filter = eth0_all();
        filter.identify_value = Some("stale".into());
        assert_eq!(validate_filter(&filter), Ok(()));
    }

    #[test]
    fn other_identify_keys_need_a_value() {
        for key in [
            IdentifyKey::ServerPort,
            IdentifyKey::ClientIp,
            IdentifyKey::ClientPort,
        ] {
            let mut filter = eth0_all();
            filter.identify_key = Some(key);
            assert_eq!(
                validate_filter(&filter),
                Err(ValidationError::MissingIdentifyValue(key.value_label()))
            );
            filter.identify_value = Some("8080".into());
            assert_eq!(validate_filter(&filter), Ok(()));
        }
    }

    #[test]
    fn filter_requires_iface_and_protocol() {
        let mut filter = eth0_all();
        filter.iface = None;
        assert_eq!(validate_filter(&filter), Err(ValidationError::MissingIface));
        let mut filter = eth0_all();
        filter.protocol = None;
        assert_eq!(validate_filter(&filter), Err(ValidationError::MissingProtocol));
    }

    #[test]
    fn jitter_above_delay_is_rejected() {
        let err = validate_jitter(&delay(100, Some("150"))).unwrap_err();
        assert_eq!(
            err,
            ValidationError::JitterExceedsDelay {
                jitter: "150".into(),
                delay: 100
            }
        );
        assert!(err.to_string().contains("must not exceed delay 100"));
        assert_eq!(validate_jitter(&delay(100, Some("100"))), Ok(()));
        assert_eq!(validate_jitter(&delay(100, Some(""))), Ok(()));
        assert!(matches!(
            validate_jitter(&delay(100, Some("abc"))),
            Err(ValidationError::InvalidJitter(_))
        ));
    }

    #[test]
    fn negative_jitter_has_its_own_message() {
        let err = validate_jitter(&delay(100, Some("-5"))).unwrap_err();
        assert_eq!(err, ValidationError::NegativeJitter("-5".into()));
        assert_eq!(err.to_string(), "Delay jitter -5 must not be negative");
    }

    #[test]
    fn jitter_of_inactive_kind_is_ignored() {
        let mut strategy = loss(10);
        strategy.delay_jitter = Some("500".into());
        assert_eq!(validate_jitter(&strategy), Ok(()));
    }

    #[test]
    fn combined_kinds_must_differ() {
        assert_eq!(
            combined(loss(1), loss(5)).validate(),
            Err(ValidationError::DuplicateStrategy("loss"))
        );
        assert_eq!(
            combined(Strategy::default(), Strategy::default()).validate(),
            Err(ValidationError::NoStrategy)
        );
        assert_eq!(combined(loss(1), Strategy::default()).validate(), Ok(()));
        assert_eq!(
            combined(loss(1), delay(10, Some("20"))).validate(),
            Err(ValidationError::JitterExceedsDelay {
                jitter: "20".into(),
                delay: 10
            })
        );
    }

    #[test]
    fn simple_page_skips_kind_rules() {
        let form = SetupForm::Simple(SimpleForm {
            filter: eth0_all(),
            strategy: Strategy::default(),
        });
        assert_eq!(form.validate(), Ok(()));
    }

    #[test]
    fn setup_params_only_carry_active_kind() {
        let params = build_setup_params(&eth0_all(), &loss(10), None, None);
        assert_eq!(params.endpoint(), SetupEndpoint::Setup);
        let query = params.query_string();
        assert!(query.contains("iface=eth0&protocol=ip&identifyKey=all&strategy=loss&loss=10"));
        assert_eq!(params.get("delay"), None);
        assert_eq!(params.get("rate"), None);
        assert_eq!(params.get("identifyValue"), None);
    }

    #[test]
    fn setup2_params_use_suffixed_keys() {
        let mut filter = eth0_all();
        filter.direction = Some(Direction::Outgoing);
        filter.identify_key = Some(IdentifyKey::ClientIp);
        filter.identify_value = Some("10.0.0.9".into());
        let params = build_setup_params(&filter, &loss(5), Some(&delay(100, Some("20"))), Some(2024));
        assert_eq!(params.endpoint(), SetupEndpoint::Setup2);
        assert_eq!(
            params.query_string(),
            "iface=eth0&protocol=ip&direction=outgoing&identifyKey=clientIp&identifyValue=10.0.0.9\
             &strategy=loss&loss=5&strategy2=delay&delay2=100&delayDistro2=20&api=2024"
        );
    }

    #[test]
    fn unset_second_kind_is_omitted() {
        let params = build_setup_params(&eth0_all(), &loss(5), Some(&Strategy::default()), None);
        assert_eq!(params.endpoint(), SetupEndpoint::Setup2);
        assert_eq!(params.get("strategy2"), None);
    }

    #[tokio::test]
    async fn rejected_submit_makes_no_call() {
        let backend = FakeBackend::default();
        let store = Arc::new(MemoryStore::new());
        let flow = SubmitFlow::with_settle(Duration::ZERO);
        let form = combined(delay(10, None), delay(20, None));

        let err = flow.setup(&backend, store.clone(), &form, None).await.unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(ValidationError::DuplicateStrategy("delay"))));
        assert!(backend.calls().is_empty());
        assert_eq!(flow.state(), FlowState::Idle);
        assert_eq!(Preferences::new(store.as_ref(), PageVariant::Combined).load_filter(), None);
    }

    #[tokio::test]
    async fn accepted_submit_saves_and_calls_backend() {
        let backend = FakeBackend::default();
        let store = Arc::new(MemoryStore::new());
        let flow = SubmitFlow::with_settle(Duration::ZERO);
        let form = SetupForm::Simple(SimpleForm {
            filter: eth0_all(),
            strategy: loss(10),
        });

        let outcome = flow.setup(&backend, store.clone(), &form, Some(2024)).await.unwrap();
        assert_eq!(outcome.refresh, 1);
        assert!(outcome.result.is_ok());
        assert_eq!(
            backend.calls(),
            vec!["config/setup?iface=eth0&protocol=ip&identifyKey=all&strategy=loss&loss=10&api=2024"]
        );
        let prefs = Preferences::new(store.as_ref(), PageVariant::Simple);
        assert_eq!(prefs.load_filter(), Some(eth0_all()));
        assert_eq!(prefs.load_strategy::<Strategy>(), Some(loss(10)));
    }

    #[tokio::test]
    async fn backend_failure_still_returns_to_idle() {
        let backend = FakeBackend {
            fail: true,
            ..FakeBackend::default()
        };
        let flow = SubmitFlow::with_settle(Duration::from_millis(20));
        let started = Instant::now();

        let outcome = flow.reset(&backend, Some("eth0")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert!(matches!(outcome.result, Err(ApiError::Backend { code: 100, .. })));
        assert_eq!(outcome.refresh, 1);
        assert_eq!(flow.state(), FlowState::Idle);

        let again = flow.reset(&backend, Some("eth0")).await.unwrap();
        assert_eq!(again.refresh, 2);
    }

    #[tokio::test]
    async fn reset_requires_iface() {
        let backend = FakeBackend::default();
        let flow = SubmitFlow::with_settle(Duration::ZERO);
        let err = flow.reset(&backend, Some(" ")).await.unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(ValidationError::MissingIface)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn overlapping_submit_is_busy() {
        let flow = SubmitFlow::with_settle(Duration::ZERO);
        let guard = flow.begin().unwrap();
        assert_eq!(flow.state(), FlowState::Validating);

        let backend = FakeBackend::default();
        let err = flow.reset(&backend, Some("eth0")).await.unwrap_err();
        assert!(matches!(err, SubmitError::Busy));

        drop(guard);
        assert_eq!(flow.state(), FlowState::Idle);
        assert!(flow.reset(&backend, Some("eth0")).await.is_ok());
    }

    #[test]
    fn form_from_browser_json() {
        let body = json!({
            "filter": {"iface": "eth0", "protocol": "ip", "identifyKey": "all"},
            "strategies": {
                "first": {"kind": "rate", "rate": 1000},
                "second": {"kind": null}
            }
        });
        let form = SetupForm::from_json(PageVariant::Combined, body).unwrap();
        assert_eq!(form.variant(), PageVariant::Combined);
        assert_eq!(form.validate(), Ok(()));
        let params = form.params(None);
        assert_eq!(params.get("rate"), Some("1000"));
        assert_eq!(params.get("strategy2"), None);
    }
}
