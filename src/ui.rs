use crate::error::ErrorReport;
use crate::model::{
    self, DELAY_MILLIS, Direction, Filter, IdentifyKey, Interface, LOSS_PERCENTS, PageVariant,
    Protocol, RATE_KBPS, Strategy, StrategyKind, StrategyPair,
};
use crate::prefs::{PreferenceStore, Preferences};
use crate::scan::{ScanReport, ScanTable};
use crate::submit::SETTLE_DELAY;
use dioxus::core::NoOpMutations;
use dioxus::prelude::*;

#[derive(Props, Clone, PartialEq)]
pub struct PageProps {
    pub variant: PageVariant,
    pub ifaces: Vec<Interface>,
    pub filter: Filter,
    pub strategies: Vec<Strategy>,
    pub init_error: ErrorReport,
    pub has_init_error: bool,
}

impl PageProps {
    /// Form defaults come from the saved preferences of this page variant,
    /// falling back to the page defaults.
    pub fn load(
        variant: PageVariant,
        store: &dyn PreferenceStore,
        ifaces: Vec<Interface>,
        init_error: Option<ErrorReport>,
    ) -> Self {
        let prefs = Preferences::new(store, variant);
        let filter = prefs.load_filter().unwrap_or_else(Filter::page_default);
        let strategies = match variant {
            PageVariant::Simple => vec![
                prefs
                    .load_strategy::<Strategy>()
                    .unwrap_or_else(|| Strategy::page_default(Some(StrategyKind::Loss))),
            ],
            PageVariant::Combined => {
                let pair = prefs
                    .load_strategy::<StrategyPair>()
                    .unwrap_or_else(StrategyPair::page_default);
                vec![pair.first, pair.second]
            }
        };
        Self {
            variant,
            ifaces,
            filter,
            strategies,
            has_init_error: init_error.is_some(),
            init_error: init_error.unwrap_or_default(),
        }
    }
}

pub fn render_page(props: PageProps) -> String {
    let title = props.variant.title();
    let mut app = VirtualDom::new_with_props(App, props);
    // Build the tree before rendering to avoid SSR panics.
    let mut noop = NoOpMutations {};
    let _ = app.rebuild(&mut noop);
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"><title>TC-WebUI · {title}</title></head><body>{}</body></html>",
        dioxus_ssr::render(&app)
    )
}

/// Result tables of one scan, inserted into the scan panel as-is.
pub fn render_scan(report: &ScanReport) -> String {
    let mut app = VirtualDom::new_with_props(
        ScanResults,
        ScanResultsProps {
            tables: report.tables(),
        },
    );
    let mut noop = NoOpMutations {};
    let _ = app.rebuild(&mut noop);
    dioxus_ssr::render(&app)
}

#[derive(Clone, PartialEq)]
struct SelectOption {
    value: String,
    label: String,
    selected: bool,
}

fn options<T: Copy + PartialEq>(
    placeholder: &str,
    items: &[T],
    current: Option<T>,
    value: impl Fn(T) -> String,
    label: impl Fn(T) -> String,
) -> Vec<SelectOption> {
    let mut list = vec![SelectOption {
        value: String::new(),
        label: placeholder.to_string(),
        selected: current.is_none(),
    }];
    list.extend(items.iter().map(|item| SelectOption {
        value: value(*item),
        label: label(*item),
        selected: current == Some(*item),
    }));
    list
}

fn numeric_options(items: &[u32], current: Option<u32>, zero_label: Option<&str>) -> Vec<SelectOption> {
    items
        .iter()
        .map(|v| SelectOption {
            value: v.to_string(),
            label: match (v, zero_label) {
                (0, Some(label)) => label.to_string(),
                _ => v.to_string(),
            },
            selected: current == Some(*v),
        })
        .collect()
}

fn visibility(base: &str, visible: bool) -> String {
    if visible {
        base.to_string()
    } else {
        format!("{base} is-hidden")
    }
}

fn jitter_hint(strategy: &Strategy) -> String {
    let delay = f64::from(strategy.delay.unwrap_or(0));
    let jitter = strategy
        .delay_jitter()
        .and_then(|j| j.parse::<f64>().ok())
        .unwrap_or(0.0);
    format!(
        "Optional; delay varies within [{}, {}] ms",
        delay - jitter,
        delay + jitter
    )
}

#[component]
fn App(props: PageProps) -> Element {
    let styles = r#"
:root { color-scheme: dark; }
* { box-sizing: border-box; }
body, html {
    margin: 0;
    padding: 0;
    background: radial-gradient(circle at 20% 20%, #171a24, #0b0d13 40%), #0b0d13;
}
.page { min-height: 100vh; display: flex; justify-content: center; padding: 36px 18px; color: #e9ecf5; font-family: "Space Grotesk", "Inter", system-ui, -apple-system, sans-serif; }
.shell { width: min(1100px, 100%); display: flex; flex-direction: column; gap: 12px; }
.header { display: flex; flex-direction: column; gap: 6px; }
.title { font-size: 26px; margin: 0; letter-spacing: 0.4px; }
.subtitle { margin: 0; color: #9aa4bc; font-size: 15px; }
.nav { display: flex; flex-wrap: wrap; gap: 10px; }
.nav-btn { padding: 10px 14px; border-radius: 12px; border: 1px solid #1f2230; background: #11131b; color: #c5cee3; font-weight: 700; letter-spacing: 0.2px; text-decoration: none; transition: transform 120ms ease, background 140ms ease, border 140ms ease; }
.nav-btn.active { background: linear-gradient(135deg, #5fb8ff, #3c8cff); color: #0a0c12; border-color: #90c8ff; box-shadow: 0 12px 28px rgba(79, 140, 255, 0.28); transform: translateY(-1px); }
.card { width: 100%; background: linear-gradient(145deg, #161a23, #0f1219); border: 1px solid #1f2230; border-radius: 16px; padding: 22px; box-shadow: 0 18px 44px rgba(0,0,0,0.35); }
.card-title { margin: 0 0 4px 0; font-size: 20px; }
.muted { color: #8f98ac; margin: 0 0 16px 0; font-size: 14px; }
.form-row { display: flex; flex-wrap: wrap; gap: 12px; margin-bottom: 12px; }
.field { display: flex; flex-direction: column; gap: 6px; padding: 12px; background: #10141d; border: 1px solid #1f2230; border-radius: 12px; min-width: 180px; }
.field-label { font-weight: 700; font-size: 14px; }
.field-hint { color: #7c859c; font-size: 12px; }
.field select, .field input { padding: 10px 12px; border-radius: 10px; border: 1px solid #262b38; background: #0f1118; color: #dfe4f3; font-weight: 700; }
.unit { color: #8f98ac; font-size: 13px; }
.was-validated select:invalid, .was-validated input:invalid { border-color: #ff4f64; }
.strategy { border-top: 1px dashed #262b38; padding-top: 12px; }
.actions { display: flex; gap: 10px; flex-wrap: wrap; align-items: center; }
.primary { padding: 12px 16px; border-radius: 12px; border: none; background: linear-gradient(135deg, #5fb8ff, #3c8cff); color: #0b0d12; font-weight: 800; font-size: 15px; letter-spacing: 0.3px; cursor: pointer; }
.primary:disabled { opacity: 0.5; cursor: not-allowed; }
.pill-btn { padding: 8px 10px; border-radius: 10px; border: 1px solid #262b38; background: #0f1118; color: #dfe4f3; font-weight: 700; cursor: pointer; }
.pill-btn:disabled { opacity: 0.5; cursor: not-allowed; }
.link-btn { background: none; border: none; color: #90c8ff; cursor: pointer; padding: 0; font-size: 14px; text-decoration: underline; }
.status { margin-top: 10px; color: #8f98ac; font-size: 14px; min-height: 18px; }
.config-panels { display: grid; grid-template-columns: repeat(auto-fit, minmax(320px, 1fr)); gap: 12px; margin-top: 14px; }
.config-panel { background: #10141d; border: 1px solid #1f2230; border-radius: 12px; padding: 12px; }
.config-panel.executing { opacity: 0.6; }
.config-head { display: flex; align-items: center; gap: 10px; }
.config-title { flex: 1; }
.config-cmd { color: #7c859c; font-size: 12px; }
.config-output { white-space: pre-wrap; font-size: 12px; color: #c5cee3; margin: 10px 0 0 0; }
.switches { display: flex; flex-wrap: wrap; gap: 10px; margin-bottom: 12px; }
.checkbox { display: flex; align-items: center; gap: 10px; padding: 10px 12px; background: #10141d; border: 1px solid #1f2230; border-radius: 12px; cursor: pointer; }
.spinner { width: 18px; height: 18px; border-radius: 50%; border: 3px solid #262b38; border-top-color: #5fb8ff; animation: spin 900ms linear infinite; }
@keyframes spin { to { transform: rotate(360deg); } }
.scan-table { width: 100%; border-collapse: collapse; margin-top: 12px; font-size: 13px; }
.scan-table th, .scan-table td { border: 1px solid #1f2230; padding: 6px 8px; text-align: left; }
.scan-table tbody tr:nth-child(odd) { background: #10141d; }
.error-panel { border-color: #ff4f64; }
.error-panel pre { white-space: pre-wrap; font-size: 12px; color: #c5cee3; }
.error-grid { display: grid; grid-template-columns: max-content 1fr; gap: 4px 12px; font-size: 14px; margin-bottom: 12px; }
.is-hidden { display: none !important; }
@media (max-width: 640px) {
    .page { padding: 20px 14px; }
    .card { padding: 18px; }
    .title { font-size: 22px; }
    .nav-btn { flex: 1; text-align: center; }
}
"#;

    let script = r#"
(() => {
  const page = document.querySelector('.page');
  const variant = page?.dataset.variant || 'simple';
  const settleMs = Number(page?.dataset.settleMs || 300);
  const form = document.getElementById('setup-form');
  const setupBtn = document.getElementById('setup-btn');
  const resetBtn = document.getElementById('reset-btn');
  const forgetBtn = document.getElementById('forget-btn');
  const formStatus = document.getElementById('form-status');
  const errorPanel = document.getElementById('error-panel');
  const faultPanel = document.getElementById('fault-panel');
  let executing = false;
  let scanRunning = false;

  const sleep = (ms) => new Promise((resolve) => setTimeout(resolve, ms));

  function field(name) {
    return form ? form.elements.namedItem(name) : null;
  }

  function text(name) {
    const el = field(name);
    const value = el && 'value' in el ? String(el.value).trim() : '';
    return value === '' ? null : value;
  }

  function num(name) {
    const value = text(name);
    return value === null ? null : Number(value);
  }

  function setText(id, value) {
    const el = document.getElementById(id);
    if (el) el.textContent = value;
  }

  function collectStrategy(suffix) {
    return {
      kind: text('strategy' + suffix),
      loss: num('loss' + suffix),
      delay: num('delay' + suffix),
      delayJitter: text('delayJitter' + suffix),
      rate: num('rate' + suffix),
    };
  }

  function collectForm() {
    const filter = {
      iface: text('iface'),
      protocol: text('protocol'),
      direction: text('direction'),
      identifyKey: text('identifyKey'),
      identifyValue: text('identifyValue'),
    };
    if (variant === 'combined') {
      return { filter, strategies: { first: collectStrategy(''), second: collectStrategy('2') } };
    }
    return { filter, strategy: collectStrategy('') };
  }

  function showError(report) {
    if (!errorPanel) return;
    setText('error-request', report.request || '');
    setText('error-status', [report.status, report.statusText].filter((v) => v != null && v !== '').join(' '));
    setText('error-code', report.code != null ? String(report.code) : '');
    setText('error-message', report.message || '');
    setText('error-body', report.body || '');
    errorPanel.classList.remove('is-hidden');
  }

  function showFault(message, response, stack) {
    if (!faultPanel) return;
    setText('fault-message', message || '');
    setText('fault-response', response || '');
    setText('fault-stack', stack || '');
    faultPanel.classList.remove('is-hidden');
  }

  function reportFailure(report) {
    if (report.kind === 'fault') {
      showFault(report.message, JSON.stringify(report, null, 2), '');
    } else {
      showError(report);
    }
  }

  async function readReport(res) {
    try {
      return await res.json();
    } catch (err) {
      return { kind: 'fault', message: `HTTP ${res.status}`, status: res.status };
    }
  }

  function post(url, body) {
    return fetch(url, {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify(body),
    });
  }

  document.getElementById('error-dismiss')?.addEventListener('click', () => errorPanel.classList.add('is-hidden'));
  document.getElementById('fault-clear')?.addEventListener('click', () => faultPanel.classList.add('is-hidden'));
  window.addEventListener('error', (evt) => showFault(evt.message, '', evt.error?.stack || ''));
  window.addEventListener('unhandledrejection', (evt) => {
    const reason = evt.reason;
    showFault(reason?.message || String(reason), reason?.response ? JSON.stringify(reason.response) : '', reason?.stack || '');
  });

  const configPanels = () => Array.from(document.querySelectorAll('[data-config-iface]'));

  async function loadConfig(panel) {
    const iface = panel.dataset.configIface;
    if (!iface) return;
    const btn = panel.querySelector('.config-refresh');
    if (btn) btn.disabled = true;
    panel.classList.add('executing');
    try {
      const res = await fetch(`/tc/console/query?iface=${encodeURIComponent(iface)}`);
      if (!res.ok) {
        reportFailure(await readReport(res));
        return;
      }
      const data = await res.json();
      panel.querySelector('.config-cmd').textContent = data.cmd || '';
      panel.querySelector('.config-output').textContent = data.output || '';
    } catch (err) {
      showError({ message: err?.message || String(err) });
    } finally {
      await sleep(settleMs);
      panel.classList.remove('executing');
      if (btn) btn.disabled = false;
    }
  }

  function refreshConfigPanels() {
    configPanels().forEach(loadConfig);
  }

  function wireConfigPanel(panel) {
    panel.querySelector('.config-refresh')?.addEventListener('click', () => loadConfig(panel));
  }

  function stampRefresh(refresh) {
    const container = document.getElementById('config-panels');
    if (container && refresh != null) container.dataset.refresh = String(refresh);
  }

  function addConfigPanel(iface) {
    const primary = document.querySelector('[data-config-primary="true"]');
    const container = document.getElementById('config-panels');
    if (!primary || !container) return;
    const panel = primary.cloneNode(true);
    panel.dataset.configPrimary = 'false';
    panel.dataset.configIface = iface;
    panel.classList.remove('is-hidden', 'executing');
    panel.querySelector('.config-title').textContent = `Interface ${iface}`;
    panel.querySelector('.config-cmd').textContent = '';
    panel.querySelector('.config-output').textContent = '';
    const btn = panel.querySelector('.config-refresh');
    if (btn) btn.disabled = false;
    wireConfigPanel(panel);
    container.appendChild(panel);
  }

  // Setup and reset can create or remove ifb devices; keep one panel per device.
  async function syncIfbPanels() {
    try {
      const res = await fetch('/tc/console/ifaces');
      if (!res.ok) {
        reportFailure(await readReport(res));
        return;
      }
      const { ifbs } = await res.json();
      const secondary = Array.from(document.querySelectorAll('[data-config-primary="false"]'));
      secondary
        .filter((panel) => !ifbs.includes(panel.dataset.configIface))
        .forEach((panel) => panel.remove());
      const shown = secondary.map((panel) => panel.dataset.configIface);
      ifbs.filter((name) => !shown.includes(name)).forEach(addConfigPanel);
    } catch (err) {
      showError({ message: err?.message || String(err) });
    }
  }

  configPanels().forEach(wireConfigPanel);

  field('iface')?.addEventListener('change', (evt) => {
    const panel = document.querySelector('[data-config-primary="true"]');
    if (!panel) return;
    const iface = evt.target.value;
    panel.dataset.configIface = iface;
    panel.querySelector('.config-title').textContent = `Interface ${iface}`;
    panel.classList.toggle('is-hidden', !iface);
    if (iface) loadConfig(panel);
  });

  field('identifyKey')?.addEventListener('change', (evt) => {
    const key = evt.target.value;
    const needs = key === 'serverPort' || key === 'clientPort' || key === 'clientIp';
    const label = key === 'clientIp' ? 'IP' : 'port';
    const group = document.querySelector('.identify-value');
    group?.classList.toggle('is-hidden', !needs);
    group?.querySelectorAll('.value-label').forEach((el) => { el.textContent = label; });
    const input = field('identifyValue');
    if (input) {
      input.required = needs;
      input.placeholder = `Enter the ${label} to match`;
    }
  });

  function updateJitterHint(box, suffix) {
    const hint = box.querySelector('.jitter-hint');
    if (!hint) return;
    const delay = Number(text('delay' + suffix) || 0);
    const jitter = Number(text('delayJitter' + suffix) || 0);
    hint.textContent = `Optional; delay varies within [${delay - jitter}, ${delay + jitter}] ms`;
  }

  document.querySelectorAll('[data-strategy]').forEach((box) => {
    const suffix = box.dataset.strategy || '';
    const kind = field('strategy' + suffix);
    kind?.addEventListener('change', () => {
      box.querySelectorAll('[data-kind]').forEach((group) => {
        group.classList.toggle('is-hidden', group.dataset.kind !== kind.value);
      });
      updateJitterHint(box, suffix);
    });
    field('delay' + suffix)?.addEventListener('change', () => updateJitterHint(box, suffix));
    field('delayJitter' + suffix)?.addEventListener('input', () => updateJitterHint(box, suffix));
  });

  function setExecuting(on) {
    executing = on;
    [setupBtn, resetBtn].forEach((btn) => { if (btn) btn.disabled = on; });
  }

  async function submit(url, body, done) {
    if (executing) return;
    formStatus.textContent = '';
    form?.classList.remove('was-validated');
    setExecuting(true);
    let reachedBackend = false;
    try {
      const res = await post(url, body);
      if (res.ok) {
        reachedBackend = true;
        const data = await res.json();
        stampRefresh(data.refresh);
        formStatus.textContent = done;
        return;
      }
      const report = await readReport(res);
      if (report.kind === 'validation') {
        form?.classList.add('was-validated');
        formStatus.textContent = report.message;
        alert(report.message);
      } else if (report.kind === 'busy') {
        formStatus.textContent = report.message;
      } else {
        reachedBackend = report.kind === 'backend';
        reportFailure(report);
      }
    } catch (err) {
      showError({ message: err?.message || String(err) });
    } finally {
      if (reachedBackend) {
        await syncIfbPanels();
        refreshConfigPanels();
      }
      setExecuting(false);
    }
  }

  setupBtn?.addEventListener('click', () => submit(`/tc/console/setup/${variant}`, collectForm(), 'Network configured'));
  resetBtn?.addEventListener('click', () => submit(`/tc/console/reset/${variant}`, { iface: text('iface') }, 'Network reset'));
  forgetBtn?.addEventListener('click', async () => {
    const res = await fetch(`/tc/console/preferences/${variant}`, { method: 'DELETE' });
    if (!res.ok) {
      reportFailure(await readReport(res));
      return;
    }
    window.location.reload();
  });

  function setScanButtons(on) {
    document.querySelectorAll('.scan-start').forEach((btn) => { btn.disabled = on; });
  }

  function wireScanPanel(panel) {
    const switches = Array.from(panel.querySelectorAll('.scan-iface'));
    const start = panel.querySelector('.scan-start');
    const spinner = panel.querySelector('.spinner');
    const results = panel.querySelector('.scan-results');
    if (results) results.innerHTML = '';
    spinner?.classList.add('is-hidden');
    switches.forEach((sw) => {
      sw.checked = false;
      sw.disabled = false;
      sw.addEventListener('change', () => {
        const picked = switches.find((s) => s.checked);
        switches.forEach((s) => { s.disabled = !!picked && s !== picked; });
      });
    });
    start?.addEventListener('click', async () => {
      if (scanRunning) return;
      scanRunning = true;
      setScanButtons(true);
      spinner?.classList.remove('is-hidden');
      const ifaces = switches.filter((s) => s.checked).map((s) => s.value);
      try {
        const res = await post('/tc/console/scan', { ifaces });
        if (!res.ok) {
          reportFailure(await readReport(res));
          return;
        }
        results.innerHTML = await res.text();
      } catch (err) {
        showError({ message: err?.message || String(err) });
      } finally {
        scanRunning = false;
        setScanButtons(false);
        spinner?.classList.add('is-hidden');
      }
    });
    panel.querySelector('.scan-append')?.addEventListener('click', appendScanPanel);
  }

  function appendScanPanel() {
    const container = document.getElementById('scan-panels');
    const first = container?.querySelector('[data-scan-panel]');
    if (!first) return;
    const copy = first.cloneNode(true);
    container.prepend(copy);
    wireScanPanel(copy);
  }

  document.querySelectorAll('[data-scan-panel]').forEach(wireScanPanel);
  refreshConfigPanels();
})();
"#;

    let variant = props.variant;
    let slug = variant.slug();
    let settle_ms = SETTLE_DELAY.as_millis().to_string();
    let selectable = model::selectable(&props.ifaces);
    let ifbs = model::ifb_devices(&props.ifaces);
    let current_iface = props
        .filter
        .iface()
        .filter(|name| selectable.iter().any(|i| i.name == *name))
        .unwrap_or_default()
        .to_string();
    let combined = variant == PageVariant::Combined;
    let strategy_forms: Vec<(Strategy, String)> = props
        .strategies
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let suffix = if idx == 0 { String::new() } else { (idx + 1).to_string() };
            (s.clone(), suffix)
        })
        .collect();
    let hint = if combined {
        "Apply two different impairments at once to the matched traffic."
    } else {
        "Apply one impairment to the matched traffic."
    };

    rsx! {
        style { dangerous_inner_html: "{styles}" }
        div { class: "page", "data-variant": "{slug}", "data-settle-ms": "{settle_ms}",
            div { class: "shell",
                NavBar { active: variant }
                ErrorPanel { report: props.init_error.clone(), visible: props.has_init_error }
                FaultPanel {}
                div { class: "card",
                    h2 { class: "card-title", "Network impairment" }
                    p { class: "muted", "{hint}" }
                    form { id: "setup-form",
                        FilterForm { ifaces: selectable.clone(), filter: props.filter.clone() }
                        for (strategy, suffix) in strategy_forms {
                            StrategyForm { strategy: strategy, suffix: suffix, allow_none: combined }
                        }
                        div { class: "actions",
                            button { id: "setup-btn", class: "primary", r#type: "button", "Apply" }
                            button { id: "reset-btn", class: "primary", r#type: "button", "Reset" }
                            button { id: "forget-btn", class: "link-btn", r#type: "button", "Forget saved settings" }
                        }
                        div { id: "form-status", class: "status" }
                    }
                    div { id: "config-panels", class: "config-panels", "data-refresh": "0",
                        ConfigPanel { iface: current_iface.clone(), primary: true }
                        for ifb in ifbs {
                            ConfigPanel { iface: ifb.name, primary: false }
                        }
                    }
                }
                if !combined {
                    div { id: "scan-panels",
                        ScanPanel { ifaces: selectable }
                    }
                }
            }
        }
        script { dangerous_inner_html: "{script}" }
    }
}

#[component]
fn NavBar(active: PageVariant) -> Element {
    let links: Vec<(&'static str, &'static str, &'static str)> = [PageVariant::Simple, PageVariant::Combined]
        .into_iter()
        .map(|v| {
            let class = if v == active { "nav-btn active" } else { "nav-btn" };
            (v.route(), v.title(), class)
        })
        .collect();

    rsx! {
        div { class: "header",
            h1 { class: "title", "TC-WebUI" }
            p { class: "subtitle", "Weak network simulation with Linux traffic control" }
        }
        div { class: "nav",
            for (href, text, class) in links {
                a { class: "{class}", href: "{href}", "{text}" }
            }
        }
    }
}

#[component]
fn ErrorPanel(report: ErrorReport, visible: bool) -> Element {
    let class = visibility("card error-panel", visible);
    let request = report.request.unwrap_or_default();
    let status = match (report.status, report.status_text) {
        (Some(code), Some(text)) => format!("{code} {text}"),
        (Some(code), None) => code.to_string(),
        _ => String::new(),
    };
    let code = report.code.map(|c| c.to_string()).unwrap_or_default();
    let body = report.body.unwrap_or_default();

    rsx! {
        div { id: "error-panel", class: "{class}",
            h2 { class: "card-title", "You got an error!" }
            div { class: "error-grid",
                span { "Request" }
                span { id: "error-request", "{request}" }
                span { "Status" }
                span { id: "error-status", "{status}" }
                span { "Code" }
                span { id: "error-code", "{code}" }
                span { "Message" }
                span { id: "error-message", "{report.message}" }
            }
            pre { id: "error-body", "{body}" }
            button { id: "error-dismiss", class: "pill-btn", r#type: "button", "Got it" }
        }
    }
}

#[component]
fn FaultPanel() -> Element {
    rsx! {
        div { id: "fault-panel", class: "card error-panel is-hidden",
            h2 { class: "card-title", "Something broke" }
            p { class: "muted", "message:" }
            pre { id: "fault-message" }
            p { class: "muted", "response:" }
            pre { id: "fault-response" }
            p { class: "muted", "stack:" }
            pre { id: "fault-stack" }
            button { id: "fault-clear", class: "pill-btn", r#type: "button", "Clear error" }
        }
    }
}

#[component]
fn SelectField(
    #[props(into)] label: String,
    #[props(into)] hint: String,
    #[props(into)] name: String,
    options: Vec<SelectOption>,
) -> Element {
    rsx! {
        label { class: "field",
            span { class: "field-label", "{label}" }
            span { class: "field-hint", "{hint}" }
            select { name: "{name}", required: true,
                for SelectOption { value, label, selected } in options {
                    option { value: "{value}", selected: selected, "{label}" }
                }
            }
        }
    }
}

#[component]
fn FilterForm(ifaces: Vec<Interface>, filter: Filter) -> Element {
    let current = filter.iface().map(str::to_string);
    let mut iface_options = vec![SelectOption {
        value: String::new(),
        label: "--select--".into(),
        selected: current.is_none(),
    }];
    iface_options.extend(ifaces.iter().map(|i| SelectOption {
        value: i.name.clone(),
        label: i.label(),
        selected: current.as_deref() == Some(i.name.as_str()),
    }));
    let protocol_options = options(
        "--select--",
        Protocol::ALL,
        filter.protocol,
        |p| p.as_str().into(),
        |p| p.label().into(),
    );
    let direction_options = options(
        "--select--",
        Direction::ALL,
        filter.direction,
        |d| d.as_str().into(),
        |d| d.label().into(),
    );
    let identify_options = options(
        "--select--",
        IdentifyKey::ALL,
        filter.identify_key,
        |k| k.as_str().into(),
        |k| k.label().into(),
    );
    let needs_value = filter.identify_key.is_some_and(IdentifyKey::needs_value);
    let value_label = filter
        .identify_key
        .map(IdentifyKey::value_label)
        .unwrap_or("port");
    let value_class = visibility("field identify-value", needs_value);
    let identify_value = filter.identify_value.clone().unwrap_or_default();

    rsx! {
        div { class: "form-row",
            SelectField { label: "Interface", hint: "Shaping applies to this interface", name: "iface", options: iface_options }
            SelectField { label: "Protocol", hint: "Shaping applies to this protocol", name: "protocol", options: protocol_options }
            SelectField { label: "Direction", hint: "Incoming or outgoing traffic", name: "direction", options: direction_options }
            SelectField { label: "Match", hint: "Which flows to impair", name: "identifyKey", options: identify_options }
            label { class: "{value_class}",
                span { class: "field-label", "By " span { class: "value-label", "{value_label}" } }
                span { class: "field-hint", "Required unless matching everything" }
                input {
                    name: "identifyValue",
                    r#type: "text",
                    required: needs_value,
                    placeholder: "Enter the {value_label} to match",
                    value: "{identify_value}",
                }
            }
        }
    }
}

#[component]
fn StrategyForm(strategy: Strategy, suffix: String, allow_none: bool) -> Element {
    let placeholder = if allow_none { "none" } else { "--select--" };
    let kind_options = options(
        placeholder,
        StrategyKind::ALL,
        strategy.kind,
        |k| k.as_str().into(),
        |k| k.label().into(),
    );
    let loss_options = numeric_options(LOSS_PERCENTS, strategy.loss, None);
    let delay_options = numeric_options(DELAY_MILLIS, strategy.delay, None);
    let rate_options = numeric_options(RATE_KBPS, strategy.rate, Some("unlimited"));
    let group_class = |kind: StrategyKind| visibility("field", strategy.kind == Some(kind));
    let loss_class = group_class(StrategyKind::Loss);
    let delay_class = group_class(StrategyKind::Delay);
    let rate_class = group_class(StrategyKind::Rate);
    let jitter = strategy.delay_jitter.clone().unwrap_or_default();
    let hint = jitter_hint(&strategy);
    let title = if suffix.is_empty() {
        "Strategy".to_string()
    } else {
        format!("Strategy {suffix}")
    };

    rsx! {
        div { class: "form-row strategy", "data-strategy": "{suffix}",
            SelectField { label: title, hint: "Impairment to apply", name: "strategy{suffix}", options: kind_options }
            label { class: "{loss_class}", "data-kind": "loss",
                span { class: "field-label", "Loss rate" }
                span { class: "field-hint", "Random packet loss" }
                select { name: "loss{suffix}",
                    for SelectOption { value, label, selected } in loss_options {
                        option { value: "{value}", selected: selected, "{label}" }
                    }
                }
                span { class: "unit", "%" }
            }
            label { class: "{delay_class}", "data-kind": "delay",
                span { class: "field-label", "Delay" }
                span { class: "field-hint", "Added latency" }
                select { name: "delay{suffix}",
                    for SelectOption { value, label, selected } in delay_options {
                        option { value: "{value}", selected: selected, "{label}" }
                    }
                }
                span { class: "unit", "ms" }
            }
            label { class: "{delay_class}", "data-kind": "delay",
                span { class: "field-label", "Delay jitter" }
                span { class: "field-hint jitter-hint", "{hint}" }
                input {
                    name: "delayJitter{suffix}",
                    r#type: "text",
                    placeholder: "Jitter in ms",
                    value: "{jitter}",
                }
                span { class: "unit", "ms" }
            }
            label { class: "{rate_class}", "data-kind": "rate",
                span { class: "field-label", "Bandwidth" }
                span { class: "field-hint", "Target bandwidth" }
                select { name: "rate{suffix}",
                    for SelectOption { value, label, selected } in rate_options {
                        option { value: "{value}", selected: selected, "{label}" }
                    }
                }
                span { class: "unit", "Kbps" }
            }
        }
    }
}

#[component]
fn ConfigPanel(iface: String, primary: bool) -> Element {
    let class = visibility("config-panel", !iface.is_empty());
    rsx! {
        div { class: "{class}", "data-config-iface": "{iface}", "data-config-primary": "{primary}",
            div { class: "config-head",
                strong { class: "config-title", "Interface {iface}" }
                small { class: "config-cmd" }
                button { class: "pill-btn config-refresh", r#type: "button", title: "Query again", "Refresh" }
            }
            pre { class: "config-output" }
        }
    }
}

#[component]
fn ScanPanel(ifaces: Vec<Interface>) -> Element {
    let switches: Vec<(String, String, String)> = ifaces
        .iter()
        .map(|i| {
            let title = format!(
                "ipv4: {}, ipv6: {}",
                i.ipv4().unwrap_or("-"),
                i.ipv6.as_deref().unwrap_or("-")
            );
            (i.name.clone(), i.label(), title)
        })
        .collect();

    rsx! {
        div { class: "card", "data-scan-panel": "true",
            h2 { class: "card-title", "Traffic scan" }
            p { class: "muted",
                "Pick one interface to capture for 15 seconds, or none to capture on any. "
                button { class: "link-btn scan-append", r#type: "button", "Scan another interface" }
            }
            div { class: "switches",
                for (name, label, title) in switches {
                    label { class: "checkbox", title: "{title}",
                        input { class: "scan-iface", r#type: "checkbox", value: "{name}" }
                        span { "{label}" }
                    }
                }
            }
            div { class: "actions",
                button { class: "primary scan-start", r#type: "button", "Start scan" }
                span { class: "spinner is-hidden", role: "status" }
            }
            div { class: "scan-results" }
        }
    }
}

#[component]
fn ScanResults(tables: Vec<ScanTable>) -> Element {
    let rendered: Vec<(String, Vec<[String; 10]>)> = tables
        .into_iter()
        .map(|table| {
            let rows = table
                .rows
                .into_iter()
                .map(|row| {
                    let mark = |local: bool, addr: String| {
                        if local { format!("(local) {addr}") } else { addr }
                    };
                    [
                        row.index.to_string(),
                        row.iface,
                        row.protocol.to_string(),
                        mark(row.source_local, row.source),
                        row.sport,
                        mark(row.dest_local, row.dest),
                        row.dport,
                        row.packets.to_string(),
                        row.bytes.to_string(),
                        row.direction.to_string(),
                    ]
                })
                .collect();
            (table.iface, rows)
        })
        .collect();
    let empty = rendered.is_empty();

    rsx! {
        if empty {
            p { class: "muted", "No traffic captured." }
        }
        for (iface, rows) in rendered {
            table { class: "scan-table", "data-iface": "{iface}",
                thead {
                    tr {
                        th { "#" }
                        th { "Interface" }
                        th { "Protocol" }
                        th { "Source" }
                        th { "Source port" }
                        th { "Destination" }
                        th { "Destination port" }
                        th { "Packets" }
                        th { "Bytes" }
                        th { "Direction" }
                    }
                }
                tbody {
                    for cells in rows {
                        tr {
                            for cell in cells {
                                td { "{cell}" }
                            }
                        }
                    }
                }
            }
        }
    }
}
