//! Browser-facing pages
//!
//! Two self-contained HTML pages rendered from inline templates: the
//! embeddable donation form (iframe target) and the OAuth callback relay
//! that forwards Blackbaud's redirect to the JSON callback endpoint.

use super::AppState;
use axum::{
    Router,
    extract::{Path, Query, State},
    response::Html,
    routing::get,
};
use std::collections::HashMap;
use std::sync::Arc;

pub fn create_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/embed/donate/{org_id}", get(donation_embed))
        .route("/auth/blackbaud/callback", get(oauth_callback_page))
        .with_state(state)
}

/// GET /embed/donate/{org_id}
///
/// Serves the donation form for iframe embedding. The page loads its
/// configuration from the public form-config endpoint, so a stale embed
/// always renders current settings.
async fn donation_embed(
    State(state): State<Arc<AppState>>,
    Path(org_id): Path<String>,
) -> Html<String> {
    let api_base = format!("{}/api", state.public_base_url.trim_end_matches('/'));

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Donation Form</title>
    <style>
        body {{ margin: 0; padding: 20px; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; }}
        .amounts button {{ margin: 4px; padding: 10px 18px; border: 1px solid #ccc; border-radius: 6px; background: #fff; cursor: pointer; }}
        .amounts button.selected {{ background: #2563eb; color: #fff; border-color: #2563eb; }}
        input {{ display: block; width: 100%; margin: 8px 0; padding: 8px; border: 1px solid #ccc; border-radius: 6px; box-sizing: border-box; }}
        #donate-btn {{ width: 100%; margin-top: 12px; padding: 12px; background: #16a34a; color: #fff; border: none; border-radius: 6px; font-size: 16px; cursor: pointer; }}
        #error {{ color: #dc2626; margin-top: 8px; }}
    </style>
</head>
<body>
    <div id="donation-root" style="max-width: 28rem; margin: 0 auto;">
        <h2 id="org-name"></h2>
        <p id="org-description"></p>
        <div class="amounts" id="preset-amounts"></div>
        <input type="number" id="custom-amount" placeholder="Custom amount" min="1" style="display:none">
        <input type="text" id="donor-name" placeholder="Your name">
        <input type="email" id="donor-email" placeholder="Your email">
        <button id="donate-btn">Donate</button>
        <div id="error"></div>
    </div>
    <script>
        const ORG_ID = {org_id};
        const API_BASE = '{api_base}';
        let selectedAmount = null;

        async function init() {{
            const res = await fetch(`${{API_BASE}}/organizations/${{ORG_ID}}/donation-form`);
            if (!res.ok) {{
                document.getElementById('error').textContent = 'This donation form is unavailable.';
                return;
            }}
            const config = await res.json();
            document.getElementById('org-name').textContent = config.organization_name;
            document.getElementById('org-description').textContent = config.description;

            const container = document.getElementById('preset-amounts');
            for (const amount of config.preset_amounts) {{
                const btn = document.createElement('button');
                btn.textContent = `$${{amount}}`;
                btn.onclick = () => {{
                    selectedAmount = amount;
                    container.querySelectorAll('button').forEach(b => b.classList.remove('selected'));
                    btn.classList.add('selected');
                    document.getElementById('custom-amount').value = '';
                }};
                container.appendChild(btn);
            }}
            if (config.custom_amount_enabled) {{
                const custom = document.getElementById('custom-amount');
                custom.style.display = 'block';
                custom.oninput = () => {{
                    selectedAmount = parseFloat(custom.value) || null;
                    container.querySelectorAll('button').forEach(b => b.classList.remove('selected'));
                }};
            }}
        }}

        document.getElementById('donate-btn').onclick = async () => {{
            const errorEl = document.getElementById('error');
            errorEl.textContent = '';
            const name = document.getElementById('donor-name').value.trim();
            const email = document.getElementById('donor-email').value.trim();
            if (!selectedAmount || !name || !email) {{
                errorEl.textContent = 'Please choose an amount and fill in your details.';
                return;
            }}
            const res = await fetch(`${{API_BASE}}/donations/checkout`, {{
                method: 'POST',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify({{
                    amount: selectedAmount,
                    donor_name: name,
                    donor_email: email,
                    org_id: ORG_ID
                }})
            }});
            if (res.ok) {{
                const data = await res.json();
                if (data.checkout_url) {{
                    window.top.location.href = data.checkout_url;
                }}
            }} else {{
                const data = await res.json().catch(() => ({{}}));
                errorEl.textContent = data.error || 'Unable to start your donation.';
            }}
        }};

        init();
    </script>
</body>
</html>"#,
        org_id = serde_json::to_string(&org_id).unwrap_or_else(|_| "\"\"".to_string()),
        api_base = api_base,
    ))
}

/// GET /auth/blackbaud/callback
///
/// The page Blackbaud redirects the admin's browser to. It relays the code
/// and state to the JSON callback endpoint (with the merchant id stashed in
/// localStorage by the dashboard before the popup opened), then reports the
/// outcome to the opener window.
async fn oauth_callback_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<String> {
    let api_base = format!("{}/api", state.public_base_url.trim_end_matches('/'));
    let code = params.get("code").cloned().unwrap_or_default();
    let oauth_state = params.get("state").cloned().unwrap_or_default();
    let error = params.get("error").cloned().unwrap_or_default();

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Connecting to Blackbaud</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; text-align: center; padding: 48px 16px; }}
        .hidden {{ display: none; }}
        #error-message {{ color: #dc2626; }}
    </style>
</head>
<body>
    <div id="loading"><p>Completing your Blackbaud connection...</p></div>
    <div id="success" class="hidden">
        <h1>Connected</h1>
        <p>Your Blackbaud account is linked. You can close this window.</p>
    </div>
    <div id="error" class="hidden">
        <h1>Connection failed</h1>
        <p id="error-message"></p>
    </div>
    <script>
        const CODE = {code};
        const STATE = {oauth_state};
        const OAUTH_ERROR = {error};
        const API_BASE = '{api_base}';

        function show(id, message) {{
            document.getElementById('loading').classList.add('hidden');
            document.getElementById(id).classList.remove('hidden');
            if (message) {{
                document.getElementById('error-message').textContent = message;
            }}
            if (window.opener) {{
                window.opener.postMessage({{
                    type: 'BLACKBAUD_AUTH_COMPLETE',
                    success: id === 'success',
                    error: message || null
                }}, '*');
                setTimeout(() => window.close(), 1500);
            }}
        }}

        async function handleCallback() {{
            if (OAUTH_ERROR) {{
                show('error', `Blackbaud returned an error: ${{OAUTH_ERROR}}`);
                return;
            }}
            if (!CODE || !STATE) {{
                show('error', 'Missing authorization code or state parameter.');
                return;
            }}
            const merchantId = localStorage.getItem('bb_merchant_id') || '';
            try {{
                const res = await fetch(`${{API_BASE}}/organizations/bbms-oauth/callback`, {{
                    method: 'POST',
                    headers: {{ 'Content-Type': 'application/json' }},
                    body: JSON.stringify({{ code: CODE, state: STATE, merchant_id: merchantId }})
                }});
                if (res.ok) {{
                    localStorage.removeItem('bb_merchant_id');
                    show('success');
                }} else {{
                    const data = await res.json().catch(() => ({{}}));
                    show('error', data.error || 'Authentication failed.');
                }}
            }} catch (err) {{
                show('error', `Network error during authentication: ${{err.message}}`);
            }}
        }}

        handleCallback();
    </script>
</body>
</html>"#,
        code = serde_json::to_string(&code).unwrap_or_else(|_| "\"\"".to_string()),
        oauth_state = serde_json::to_string(&oauth_state).unwrap_or_else(|_| "\"\"".to_string()),
        error = serde_json::to_string(&error).unwrap_or_else(|_| "\"\"".to_string()),
        api_base = api_base,
    ))
}
