//! Minimal sign-in page served at `GET /login`.

use axum::response::Html;

const LOGIN_PAGE: &str = r##"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Zee Ordering · Sign in</title>
<style>
  body { font-family: system-ui, sans-serif; background: #f8fafc; color: #0f172a;
         display: flex; min-height: 100vh; align-items: center; justify-content: center; margin: 0; }
  form { background: #fff; padding: 2rem; border-radius: 12px; width: 320px;
         box-shadow: 0 1px 3px rgba(15, 23, 42, .12); display: grid; gap: .75rem; }
  input, button { font: inherit; padding: .6rem .75rem; border-radius: 8px; border: 1px solid #cbd5e1; }
  button { background: #1e293b; color: #fff; border: none; cursor: pointer; }
  .muted { color: #64748b; font-size: .85rem; }
  #status { min-height: 1.2em; font-size: .85rem; color: #b91c1c; }
  a { color: #334155; font-size: .85rem; }
</style>
</head>
<body>
<form id="login">
  <h1 style="margin:0">Zee Ordering</h1>
  <span class="muted">Admin sign-in</span>
  <input id="email" type="email" placeholder="Admin email" autocomplete="username" required>
  <input id="password" type="password" placeholder="Password" autocomplete="current-password" required>
  <button type="submit">Sign in</button>
  <a href="#" id="forgot">Forgot credentials?</a>
  <div id="status"></div>
</form>
<script>
  const params = new URLSearchParams(location.search);
  const raw = params.get("next") || "/";
  const next = raw.startsWith("/") && !raw.startsWith("//") ? raw : "/";
  const status = document.getElementById("status");

  async function post(path, body) {
    const res = await fetch(path, {
      method: "POST",
      headers: { "content-type": "application/json" },
      credentials: "same-origin",
      body: JSON.stringify(body),
    });
    const json = await res.json().catch(() => ({}));
    return { ok: res.ok, message: json.error ? json.error.message : "" };
  }

  document.getElementById("login").addEventListener("submit", async (event) => {
    event.preventDefault();
    status.textContent = "";
    const result = await post("/api/v1/auth/login", {
      email: document.getElementById("email").value,
      password: document.getElementById("password").value,
    });
    if (result.ok) {
      location.href = next;
    } else {
      status.textContent = result.message || "Sign-in failed.";
    }
  });

  document.getElementById("forgot").addEventListener("click", async (event) => {
    event.preventDefault();
    const email = document.getElementById("email").value;
    const result = await post("/api/v1/auth/forgot", { email });
    status.textContent = result.ok ? "Recovery notice sent to the owner." : (result.message || "Request failed.");
  });
</script>
</body>
</html>
"##;

pub(super) async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}
