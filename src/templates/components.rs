//! Page shell for the demo server.

use crate::text::html_escape;

use super::styles::STYLE;

// ============================================================================
// Demo Page
// ============================================================================

pub fn base_html(room: &str, list_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - presence</title>
    <style>{STYLE}</style>
</head>
<body>
    <h1>Room: {title}</h1>
    <form id="join-form">
        <input name="id" placeholder="user id" required>
        <input name="displayName" placeholder="display name">
        <input name="avatarUrl" placeholder="avatar url">
        <button type="submit">Join</button>
    </form>
    {list_html}
    <script>
    async function post(url, body) {{
        await fetch(url, {{
            method: 'POST',
            headers: {{ 'Content-Type': 'application/json' }},
            body: JSON.stringify(body),
        }});
        setTimeout(() => location.reload(), 150);
    }}

    function ui(event) {{
        return post('/api/ui', event);
    }}

    document.getElementById('join-form').addEventListener('submit', (e) => {{
        e.preventDefault();
        const data = Object.fromEntries(new FormData(e.target));
        if (!data.avatarUrl) delete data.avatarUrl;
        post('/api/join', data);
    }});

    const collapse = document.querySelector('.gi-collapse');
    if (collapse) collapse.addEventListener('click', () => ui({{ type: 'collapse' }}));

    const icon = document.querySelector('.gi-icon');
    const input = document.querySelector('.gi-set-name');
    if (icon && input) {{
        icon.addEventListener('click', async () => {{
            await fetch('/api/ui', {{
                method: 'POST',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify({{ type: 'input', value: input.value }}),
            }});
            ui({{ type: 'edit' }});
        }});
        input.addEventListener('keydown', async (e) => {{
            const key = {{ Enter: 'enter', Tab: 'tab', Escape: 'escape' }}[e.key];
            if (!key) return;
            e.preventDefault();
            await fetch('/api/ui', {{
                method: 'POST',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify({{ type: 'input', value: input.value }}),
            }});
            ui({{ type: 'keydown', key }});
        }});
    }}
    </script>
</body>
</html>"#,
        title = html_escape(room),
    )
}
