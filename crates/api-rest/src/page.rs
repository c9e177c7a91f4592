//! The single page served at `/`.
//!
//! The page posts the question to `/api/analyze` and renders whichever state comes back. All
//! values returned by the server are inserted with `textContent`, never as markup.

use medquery_core::SAMPLE_QUESTIONS;

const SAMPLE_QUESTIONS_SLOT: &str = "<!-- sample-questions -->";

/// Renders the page with the sample-question sidebar filled in.
pub fn render_index() -> String {
    let items: String = SAMPLE_QUESTIONS
        .iter()
        .map(|q| format!("<li>{}</li>", escape_html(q)))
        .collect();
    INDEX_HTML.replacen(SAMPLE_QUESTIONS_SLOT, &items, 1)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Healthcare Analytics</title>
  <style>
    * { box-sizing: border-box; }
    body {
      margin: 0; display: flex; min-height: 100vh;
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', system-ui, sans-serif;
      color: #1c1917; background: #fafaf9;
    }
    aside { width: 300px; padding: 24px; background: #f0f2f6; }
    aside h3 { margin-top: 0; }
    aside li { margin-bottom: 8px; }
    main { flex: 1; padding: 32px 48px; }
    textarea { width: 100%; height: 100px; padding: 8px; font: inherit; }
    button { margin-top: 12px; padding: 8px 16px; font: inherit; cursor: pointer; }
    button:disabled { cursor: wait; opacity: 0.6; }
    pre { background: #f5f5f4; padding: 12px; overflow-x: auto; }
    table { border-collapse: collapse; width: 100%; margin-bottom: 16px; }
    th, td { border: 1px solid #d6d3d1; padding: 6px 10px; text-align: left; }
    th { background: #f5f5f4; }
    .notice { padding: 12px; border-radius: 4px; margin: 12px 0; }
    .info { background: #e0f2fe; }
    .warning { background: #fef9c3; }
    .error { background: #fee2e2; }
    .hidden { display: none; }
    svg { width: 100%; height: 260px; background: #fff; border: 1px solid #e7e5e4; }
  </style>
</head>
<body>
  <aside>
    <h3>&#128161; Sample Questions</h3>
    <ul>
      <!-- sample-questions -->
    </ul>
  </aside>
  <main>
    <h1>&#127973; Smart Healthcare Data Explorer</h1>
    <label for="question">Enter your healthcare data question:</label>
    <textarea id="question" placeholder="e.g., Show patients with cholesterol levels above 200 mg/dL"></textarea>
    <button id="analyze">Analyze Data</button>
    <div id="status" class="notice info hidden"></div>
    <div id="messages"></div>
    <section id="sql-section" class="hidden">
      <h3>Generated SQL Query</h3>
      <pre><code id="sql"></code></pre>
    </section>
    <section id="results-section" class="hidden">
      <h3>Analysis Results</h3>
      <table id="results"></table>
      <div id="chart-section" class="hidden">
        <label for="chart-column">Select column to visualize:</label>
        <select id="chart-column"></select>
        <svg id="chart" viewBox="0 0 600 260" preserveAspectRatio="none"></svg>
      </div>
    </section>
  </main>
  <script>
    const $ = (id) => document.getElementById(id);
    let charts = [];

    function show(id, visible) { $(id).classList.toggle('hidden', !visible); }

    function notice(kind, text) {
      const div = document.createElement('div');
      div.className = 'notice ' + kind;
      div.textContent = text;
      $('messages').appendChild(div);
    }

    function reset() {
      $('messages').replaceChildren();
      $('results').replaceChildren();
      $('chart-column').replaceChildren();
      $('chart').replaceChildren();
      charts = [];
      show('sql-section', false);
      show('results-section', false);
      show('chart-section', false);
    }

    function renderTable(table) {
      const head = document.createElement('tr');
      for (const name of table.columns) {
        const th = document.createElement('th');
        th.textContent = name;
        head.appendChild(th);
      }
      $('results').appendChild(head);
      for (const row of table.rows) {
        const tr = document.createElement('tr');
        for (const cell of row) {
          const td = document.createElement('td');
          td.textContent = cell === null ? 'None' : String(cell);
          tr.appendChild(td);
        }
        $('results').appendChild(tr);
      }
      show('results-section', true);

      charts = table.charts;
      if (charts.length > 0) {
        for (const series of charts) {
          const opt = document.createElement('option');
          opt.value = series.column;
          opt.textContent = series.column;
          $('chart-column').appendChild(opt);
        }
        show('chart-section', true);
        drawChart(charts[0]);
      }
    }

    function drawChart(series) {
      const svg = $('chart');
      svg.replaceChildren();
      const points = series.points.map((v, i) => [i, v]).filter(([, v]) => v !== null);
      if (points.length === 0) return;
      const values = points.map(([, v]) => v);
      const min = Math.min(...values), max = Math.max(...values);
      const span = max - min || 1;
      const last = Math.max(series.points.length - 1, 1);
      const coords = points.map(([i, v]) =>
        [20 + (560 * i) / last, 240 - (220 * (v - min)) / span]);
      const line = document.createElementNS('http://www.w3.org/2000/svg', 'polyline');
      line.setAttribute('points', coords.map(([x, y]) => x + ',' + y).join(' '));
      line.setAttribute('fill', 'none');
      line.setAttribute('stroke', '#2563eb');
      line.setAttribute('stroke-width', '2');
      svg.appendChild(line);
      for (const [x, y] of coords) {
        const dot = document.createElementNS('http://www.w3.org/2000/svg', 'circle');
        dot.setAttribute('cx', x);
        dot.setAttribute('cy', y);
        dot.setAttribute('r', 3);
        dot.setAttribute('fill', '#2563eb');
        svg.appendChild(dot);
      }
    }

    function render(res) {
      if (res.sql !== undefined) {
        $('sql').textContent = res.sql;
        show('sql-section', true);
      }
      switch (res.state) {
        case 'warning': notice('warning', res.message); break;
        case 'generation_failed': notice('error', res.message); break;
        case 'execution_failed':
          notice('error', res.message);
          notice('info', res.notice);
          break;
        case 'results': renderTable(res.table); break;
        case 'no_results': notice('info', res.notice); break;
        default: notice('error', res.message || 'Unexpected response');
      }
    }

    $('chart-column').addEventListener('change', (e) => {
      const series = charts.find((c) => c.column === e.target.value);
      if (series) drawChart(series);
    });

    $('analyze').addEventListener('click', async () => {
      reset();
      $('analyze').disabled = true;
      $('status').textContent = '\u{1F50D} Analyzing medical data...';
      show('status', true);
      try {
        const response = await fetch('/api/analyze', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({ question: $('question').value }),
        });
        render(await response.json());
      } catch (err) {
        notice('error', 'Error processing request: ' + err);
      } finally {
        show('status', false);
        $('analyze').disabled = false;
      }
    });
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_questions_fill_the_sidebar() {
        let page = render_index();
        assert!(!page.contains(SAMPLE_QUESTIONS_SLOT));
        for q in SAMPLE_QUESTIONS {
            assert!(page.contains(&format!("<li>{q}</li>")));
        }
    }

    #[test]
    fn page_has_the_interface_elements() {
        let page = render_index();
        assert!(page.contains("<title>Healthcare Analytics</title>"));
        assert!(page.contains("Smart Healthcare Data Explorer"));
        assert!(page.contains("<textarea id=\"question\""));
        assert!(page.contains(">Analyze Data</button>"));
        assert!(page.contains("Select column to visualize:"));
    }

    #[test]
    fn markup_in_text_is_escaped() {
        assert_eq!(
            escape_html("<200 mg/dL & \"high\""),
            "&lt;200 mg/dL &amp; &quot;high&quot;"
        );
    }
}
