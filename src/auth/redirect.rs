//! Works out where to send a user before and after they log in.

use axum::{extract::Request, http::Uri};

use crate::{auth::Role, endpoints};

/// Only same-site paths are accepted, and never the log-in page itself.
fn is_safe_redirect_url(redirect_url: &str) -> bool {
    if !redirect_url.starts_with('/') || redirect_url.starts_with("//") {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map(|(path, _)| path)
        .unwrap_or(redirect_url);

    path != endpoints::LOG_IN_VIEW && path != endpoints::LOG_IN_API
}

/// Strip `raw_url` down to a safe path and query, or `None` if it points off site.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// The log-in URL that brings the user back to the page they asked for.
///
/// HTMX requests to `/api` routes come from a page, so the page in
/// `HX-Current-URL` is used instead of the API route.
pub fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let redirect_target = if request.uri().path().starts_with("/api") {
        redirect_target_from_hx_request(request)?
    } else {
        normalize_redirect_url(request.uri().path_and_query()?.as_str())?
    };

    build_log_in_redirect_url_from_target(&redirect_target)
}

pub(super) fn build_log_in_redirect_url_from_target(redirect_target: &str) -> Option<String> {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(param) => Some(format!("{}?{}", endpoints::LOG_IN_VIEW, param)),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {redirect_target}: {error}");
            None
        }
    }
}

fn redirect_target_from_hx_request(request: &Request) -> Option<String> {
    let headers = request.headers();
    let is_hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    if !is_hx_request {
        tracing::warn!("Missing HX-Request header for /api request.");
        return None;
    }

    let Some(current_url) = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())
    else {
        tracing::warn!("Missing HX-Current-URL header for /api request.");
        return None;
    };

    // HX-Current-URL is absolute, so only keep the path and query.
    let path_and_query = current_url
        .parse::<Uri>()
        .ok()
        .and_then(|uri| uri.path_and_query().map(|pq| pq.as_str().to_owned()));

    let redirect_url = path_and_query.filter(|url| is_safe_redirect_url(url));
    if redirect_url.is_none() {
        tracing::warn!("Invalid HX-Current-URL header value: {current_url}");
    }

    redirect_url
}

/// Where to go after logging in: the requested page if there was one,
/// otherwise the landing page for the user's role.
pub fn post_log_in_target(role: Role, redirect_url: Option<&str>) -> String {
    match redirect_url {
        Some(url) => url.to_owned(),
        None if role.is_admin() => endpoints::ADMIN_DASHBOARD_VIEW.to_owned(),
        None => endpoints::DASHBOARD_VIEW.to_owned(),
    }
}

#[cfg(test)]
mod redirect_tests {
    use axum::{body::Body, extract::Request};

    use crate::{
        auth::{
            Role,
            redirect::{build_log_in_redirect_url, normalize_redirect_url, post_log_in_target},
        },
        endpoints,
    };

    #[test]
    fn rejects_off_site_redirects() {
        assert_eq!(normalize_redirect_url("https://evil.example/steal"), None);
        assert_eq!(normalize_redirect_url("//evil.example"), None);
        assert_eq!(normalize_redirect_url(endpoints::LOG_IN_VIEW), None);
    }

    #[test]
    fn keeps_path_and_query() {
        assert_eq!(
            normalize_redirect_url("/transactions?filter_by=month").as_deref(),
            Some("/transactions?filter_by=month")
        );
    }

    #[test]
    fn page_request_redirects_back_to_page() {
        let request = Request::builder()
            .uri("/budgets")
            .body(Body::empty())
            .unwrap();

        assert_eq!(
            build_log_in_redirect_url(&request).as_deref(),
            Some("/log_in?redirect_url=%2Fbudgets")
        );
    }

    #[test]
    fn api_request_redirects_back_to_current_page() {
        let request = Request::builder()
            .uri("/api/budgets")
            .header("hx-request", "true")
            .header("hx-current-url", "http://localhost:3000/budgets")
            .body(Body::empty())
            .unwrap();

        assert_eq!(
            build_log_in_redirect_url(&request).as_deref(),
            Some("/log_in?redirect_url=%2Fbudgets")
        );
    }

    #[test]
    fn admins_land_on_admin_dashboard() {
        assert_eq!(
            post_log_in_target(Role::Admin, None),
            endpoints::ADMIN_DASHBOARD_VIEW
        );
        assert_eq!(post_log_in_target(Role::User, None), endpoints::DASHBOARD_VIEW);
        assert_eq!(
            post_log_in_target(Role::Admin, Some("/budgets")),
            "/budgets"
        );
    }
}
