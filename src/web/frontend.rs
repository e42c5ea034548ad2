//! HTML shells for the served pages.
//!
//! The dashboard body comes from the server-side [`Document`](crate::dom::Document);
//! these shells add the stylesheet links, a small stylesheet and the page
//! script that mounts Chart.js instances from `data-chart-config` and routes
//! `data-action` clicks back to the server.

const HEAD: &str = r##"<!DOCTYPE html>
<html lang="ja">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css">
<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css">
"##;

const STYLE: &str = r##"<style>
:root {
  --surface: #ffffff;
  --muted: #6c757d;
  --border: #dee2e6;
  --radius: 8px;
}

body { background: #f5f6fa; }
main { padding: 24px; }

.navbar { padding: 8px 24px; gap: 16px; }
.navbar .nav-link { color: #adb5bd; cursor: pointer; }
.navbar .nav-link.active { color: #fff; font-weight: 600; }
.navbar-tools { display: flex; gap: 8px; }

.dashboard-section { margin-bottom: 32px; }
.dashboard-section h2 { font-size: 18px; margin-bottom: 16px; }

/* Cards */
.card-grid {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
  gap: 16px;
}
.stat-card { padding: 16px; border-radius: var(--radius); }
.stat-card .card-title { color: var(--muted); font-size: 13px; }
.stat-card .card-value { font-size: 26px; font-weight: 700; }

/* Table */
.table-tools { display: flex; gap: 12px; margin-bottom: 12px; }
.table-tools .form-control { max-width: 320px; }
.table-tools .form-select { max-width: 180px; }

/* Charts */
.chart-container {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 16px;
  margin-bottom: 16px;
}

/* Activity feed */
.activity-item { display: flex; gap: 12px; padding: 10px 0; border-bottom: 1px solid var(--border); }
.activity-icon {
  width: 36px; height: 36px; border-radius: 50%;
  display: flex; align-items: center; justify-content: center; color: #fff;
}
.activity-title { font-weight: 600; }
.activity-description { color: var(--muted); }
.activity-time { color: var(--muted); font-size: 12px; }

.loading-indicator { padding: 12px; color: var(--muted); }
.modal.show { background: rgba(0, 0, 0, 0.4); }
#line-restriction-message button:hover { background: #009900 !important; }
</style>
"##;

const DASHBOARD_SCRIPT: &str = r##"<script src="https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js"></script>
<script>
// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------
const TICKS = {
  yen: v => '¥' + Number(v).toLocaleString('ja-JP'),
  percent: v => v + '%',
};

function mountCharts() {
  if (typeof Chart === 'undefined') return;
  document.querySelectorAll('canvas[data-chart-config]').forEach(canvas => {
    const cfg = JSON.parse(canvas.dataset.chartConfig);
    const y = cfg.options && cfg.options.scales && cfg.options.scales.y;
    if (y && y.ticks && TICKS[y.ticks.format]) {
      y.ticks = { callback: TICKS[y.ticks.format] };
    }
    new Chart(canvas, cfg);
  });
}

// ---------------------------------------------------------------------------
// Event delegation
// ---------------------------------------------------------------------------
async function call(method, path) {
  const res = await fetch(path, { method });
  if (res.redirected) {
    window.location.href = res.url;
    return false;
  }
  return true;
}

const ACTIONS = {
  'refresh': () => call('POST', '/refresh'),
  'logout': () => call('POST', '/logout'),
  'navigate': el => call('GET', '/section/' + encodeURIComponent(el.dataset.target)),
  'view-company': el => call('GET', '/companies/' + el.dataset.companyId),
  'edit-company': el => call('POST', '/companies/' + el.dataset.companyId + '/edit'),
  'close-modal': () => call('POST', '/modal/close'),
};

document.addEventListener('click', async e => {
  const el = e.target.closest('[data-action]');
  if (!el || !ACTIONS[el.dataset.action]) return;
  e.preventDefault();
  if (await ACTIONS[el.dataset.action](el)) window.location.reload();
});

const search = document.getElementById('search-input');
if (search) {
  search.addEventListener('input', async e => {
    const res = await fetch('/search?q=' + encodeURIComponent(e.target.value));
    const data = await res.json();
    const body = document.getElementById('companies-table-body');
    if (body && typeof data.html === 'string') body.innerHTML = data.html;
  });
}

const dateFilter = document.getElementById('date-filter');
if (dateFilter) {
  dateFilter.addEventListener('change', e => {
    fetch('/date-filter?range=' + encodeURIComponent(e.target.value));
  });
}

// ---------------------------------------------------------------------------
// Auto reload (the server refreshes on its own timer)
// ---------------------------------------------------------------------------
const reloadSecs = Number(document.body.dataset.reloadSecs || 300);
setInterval(() => window.location.reload(), reloadSecs * 1000);

mountCharts();
</script>
"##;

const WIDGET_SCRIPT: &str = r##"<script>
document.addEventListener('click', e => {
  const el = e.target.closest('[data-action="open-uri"]');
  if (el) window.open(el.dataset.uri, '_blank');
});
</script>
"##;

fn shell(title: &str, body_attrs: &str, body_html: &str, script: &str) -> String {
    let mut html = String::with_capacity(HEAD.len() + STYLE.len() + body_html.len() + script.len());
    html.push_str(HEAD);
    html.push_str("<title>");
    html.push_str(&crate::dom::html::escape_text(title));
    html.push_str("</title>\n");
    html.push_str(STYLE);
    html.push_str("</head>\n<body");
    html.push_str(body_attrs);
    html.push_str(">\n");
    html.push_str(body_html);
    html.push('\n');
    html.push_str(script);
    html.push_str("</body>\n</html>\n");
    html
}

/// The admin dashboard page around the rendered `<body>` content.
pub fn dashboard_page(body_html: &str, reload_secs: u64) -> String {
    shell(
        "管理ダッシュボード",
        &format!(" data-reload-secs=\"{reload_secs}\""),
        body_html,
        DASHBOARD_SCRIPT,
    )
}

/// A product page with the restriction widget applied.
pub fn widget_page(body_html: &str) -> String {
    shell("AIコレクションズ", "", body_html, WIDGET_SCRIPT)
}

/// Landing page after logout.
pub fn login_page() -> String {
    let body = r#"<main class="container py-5">
<h1 class="h4">ログアウトしました</h1>
<p>ログインは管理者ログイン画面から行ってください。トークンを取得済みの場合は
<code>collections-console login &lt;token&gt;</code> で保存できます。</p>
<a class="btn btn-primary" href="/">ダッシュボードへ戻る</a>
</main>"#;
    shell("ログイン", "", body, "")
}
