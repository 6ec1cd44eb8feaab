//! Browser page served at `/`.

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Santra</title>
<style>
  body { font-family: system-ui, sans-serif; margin: 2rem; color: #333; }
  main { display: grid; grid-template-columns: 320px 1fr; gap: 2rem; }
  textarea { width: 100%; min-height: 8rem; }
  ul { list-style: none; padding: 0; }
  li { padding: .4rem 0; border-bottom: 1px solid #eee; cursor: pointer; }
  li small { color: #888; display: block; }
  #status { min-height: 1.5rem; }
  #graph { border: 1px solid #ddd; }
  #detail { background: #fafafa; padding: 1rem; }
  #detail pre { background: #eee; padding: .5rem; overflow-x: auto; }
  .controls button { margin-right: .25rem; }
</style>
</head>
<body>
<h1>Santra</h1>
<main>
  <section>
    <form id="capture">
      <textarea name="idea" placeholder="Describe an idea..."></textarea>
      <button type="submit">Capture</button>
    </form>
    <p id="status"></p>
    <p><span id="nodeCount">0 nodes</span> &middot; <span id="linkCount">0 connections</span></p>
    <ul id="ideas"></ul>
  </section>
  <section>
    <div class="controls">
      <button id="zoomIn" type="button">+</button>
      <button id="zoomOut" type="button">&minus;</button>
      <button id="resetView" type="button">Reset</button>
    </div>
    <img id="graph" src="/graph.svg" alt="Idea graph" width="800" height="600">
    <article id="detail"></article>
  </section>
</main>
<script>
const $ = (id) => document.getElementById(id);
const view = { zoom: 0, highlight: null };

function drawGraph() {
  const query = new URLSearchParams();
  if (view.highlight) query.set('highlight', view.highlight);
  if (view.zoom !== 0) query.set('zoom', String(view.zoom));
  const qs = query.toString();
  $('graph').src = qs ? `/graph.svg?${qs}` : '/graph.svg';
}

function escapeHtml(text) {
  return text.replace(/[&<>"']/g, (c) => ({
    '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;',
  })[c]);
}

function stripFrontmatter(markdown) {
  return markdown.replace(/^---\r?\n[\s\S]*?\r?\n---\r?\n(\r?\n)?/, '');
}

function renderMarkdown(markdown) {
  const blocks = [];
  let html = escapeHtml(stripFrontmatter(markdown))
    .replace(/```[^\n]*\n([\s\S]*?)```/g, (_, code) => {
      blocks.push(`<pre><code>${code}</code></pre>`);
      return `\u0000${blocks.length - 1}\u0000`;
    })
    .replace(/^### (.*)$/gm, '<h3>$1</h3>')
    .replace(/^## (.*)$/gm, '<h2>$1</h2>')
    .replace(/^# (.*)$/gm, '<h1>$1</h1>')
    .replace(/\*\*(.*?)\*\*/g, '<strong>$1</strong>')
    .replace(/\*(.*?)\*/g, '<em>$1</em>')
    .replace(/`([^`]+)`/g, '<code>$1</code>')
    .replace(/\n/g, '<br>');
  return html.replace(/\u0000(\d+)\u0000/g, (_, i) => blocks[Number(i)]);
}

$('zoomIn').onclick = () => { view.zoom += 1; drawGraph(); };
$('zoomOut').onclick = () => { view.zoom -= 1; drawGraph(); };
$('resetView').onclick = () => { view.zoom = 0; drawGraph(); };

async function refresh(highlight) {
  const ideas = await fetch('/list-ideas').then((r) => r.json());
  const list = $('ideas');
  list.replaceChildren(...ideas.map((idea) => {
    const li = document.createElement('li');
    li.textContent = idea.title;
    const meta = document.createElement('small');
    meta.textContent = (idea.tags || []).join(', ');
    li.appendChild(meta);
    li.onclick = () => show(idea.id);
    return li;
  }));
  const scene = await fetch('/graph').then((r) => r.json());
  const plural = (n, w) => `${n} ${w}${n === 1 ? '' : 's'}`;
  $('nodeCount').textContent = plural(scene.info.nodes, 'node');
  $('linkCount').textContent = plural(scene.info.links, 'connection');
  view.highlight = highlight || null;
  drawGraph();
}

async function show(id) {
  const markdown = await fetch(`/idea/${encodeURIComponent(id)}`).then((r) => r.text());
  $('detail').innerHTML = renderMarkdown(markdown);
  refresh(id);
}

$('capture').onsubmit = async (event) => {
  event.preventDefault();
  const idea = event.target.idea.value;
  $('status').textContent = 'Processing...';
  const response = await fetch('/process-idea', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({ idea }),
  });
  const body = await response.json();
  if (!response.ok) {
    $('status').textContent = body.error || `HTTP ${response.status}`;
    return;
  }
  const saved = body.ideas || [body];
  $('status').textContent = `Saved ${saved.length} idea(s)`;
  event.target.reset();
  refresh(saved[0].id);
};

refresh();
</script>
</body>
</html>
"#;
