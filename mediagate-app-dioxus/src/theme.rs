/// Stylesheet injected into the webview.
pub const APP_CSS: &str = r"
:root {
    --bg: #111;
    --fg: #eee;
    --muted: #888;
    --accent: #3a7bd5;
    --error: #d9534f;
}

html, body {
    margin: 0;
    height: 100%;
    background: var(--bg);
    color: var(--fg);
    font-family: sans-serif;
}

.app {
    display: flex;
    flex-direction: column;
    height: 100vh;
    outline: none;
}

.login-overlay {
    display: flex;
    flex-direction: column;
    align-items: center;
    justify-content: center;
    gap: 12px;
    height: 100vh;
}

.login-overlay input {
    font-size: 1.2em;
    padding: 6px 10px;
}

.login-error {
    color: var(--error);
}

.filter-panel {
    display: flex;
    flex-wrap: wrap;
    gap: 8px;
    padding: 8px;
}

.facet {
    border: 1px solid var(--muted);
    border-radius: 4px;
}

.facet-option {
    margin-right: 8px;
    white-space: nowrap;
}

.error-banner {
    background: var(--error);
    padding: 4px 8px;
}

.stage {
    flex: 1;
    display: flex;
    align-items: center;
    justify-content: center;
    min-height: 0;
}

.stage.empty {
    color: var(--muted);
}

.surface {
    max-width: 100%;
    max-height: 100%;
    object-fit: contain;
}

.controls {
    display: flex;
    justify-content: center;
    gap: 8px;
    padding: 8px;
}

.control.play.active {
    background: var(--accent);
    color: var(--fg);
}

.status {
    text-align: center;
    color: var(--muted);
    padding-bottom: 8px;
}
";
