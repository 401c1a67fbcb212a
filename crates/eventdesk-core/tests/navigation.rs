//! End-to-end navigation over the admin routes with a file-backed session.

use eventdesk_core::auth::FileStorage;
use eventdesk_core::routing::{admin_routes, AuthGuard, Decision, NavigationGuard, RouteTable};
use eventdesk_core::{Router, SessionStore};

fn table() -> RouteTable {
    RouteTable::new(admin_routes()).expect("admin routes are valid")
}

#[test]
fn guard_decisions_for_admin_routes() {
    let dir = tempfile::tempdir().unwrap();
    let table = table();
    let mut session = SessionStore::open(FileStorage::new(dir.path()));

    let dashboard = table.resolve("/dashboard").unwrap();
    let login = table.resolve("/login").unwrap();
    let unknown = table.resolve("/nonexistent-path").unwrap();

    let guard = AuthGuard::new(&session);
    assert_eq!(guard.evaluate(&dashboard, None), Decision::Redirect("/login".into()));
    assert_eq!(guard.evaluate(&login, None), Decision::Proceed);
    assert_eq!(guard.evaluate(&unknown, None), Decision::Redirect("/login".into()));

    session.login("abc123").unwrap();
    let guard = AuthGuard::new(&session);
    assert_eq!(guard.evaluate(&dashboard, Some(&login)), Decision::Proceed);
    assert_eq!(guard.evaluate(&unknown, None), Decision::Redirect("/login".into()));
}

#[test]
fn session_survives_restart_and_opens_protected_views() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut session = SessionStore::open(FileStorage::new(dir.path()));
        session.login("abc123").unwrap();
    }

    let session = SessionStore::open(FileStorage::new(dir.path()));
    assert_eq!(session.token(), Some("abc123"));

    let mut router = Router::new(table());
    let guard = AuthGuard::new(&session);
    for path in ["/dashboard", "/manage-events", "/manage-tickets", "/manage-organizers"] {
        let navigation = router.navigate(path, &guard).unwrap();
        assert_eq!(navigation.route.path(), path);
        assert!(!navigation.was_redirected());
    }
    assert_eq!(router.history().len(), 3);
}

#[test]
fn logout_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut session = SessionStore::open(FileStorage::new(dir.path()));
        session.login("abc123").unwrap();
        session.logout();
        session.logout();
        assert_eq!(session.token(), None);
    }

    let session = SessionStore::open(FileStorage::new(dir.path()));
    assert!(!session.is_authenticated());

    let mut router = Router::new(table());
    let navigation = router.navigate("/dashboard", &AuthGuard::new(&session)).unwrap();
    assert_eq!(navigation.route.view(), Some("AdminLogin"));
}
