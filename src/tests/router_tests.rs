#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
        response::IntoResponse,
        Router,
    };
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::chain::handler_fn;
    use crate::config::AppConfig;
    use crate::handlers::echo::ECHO_BODY_LIMIT;
    use crate::handlers::HandlerRegistry;
    use crate::tests::support::{test_loader, test_registry, write};
    use crate::{LoadOptions, RouteLoader, RouteRegistrar, RouterMiddleware, RouterOptions};

    async fn load_app(files: &[(&str, &str)], options: RouterOptions) -> (RouterMiddleware, Router) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            write(dir.path(), name, content);
        }
        let (loader, _) = test_loader();
        let mut router = RouterMiddleware::new(options);
        loader.load_routes(&mut router, dir.path(), &LoadOptions::default()).await.unwrap();
        let app = router.routes();
        (router, app)
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(res: axum::response::Response) -> String {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn serves_every_declared_path() {
        let (router, app) = load_app(&[("a.toml", "path = [\"/a\", \"/b\"]\nget = \"ok\"\n")], RouterOptions::default()).await;
        assert_eq!(
            router.route_table(),
            vec![(Method::GET, "/a".to_string()), (Method::GET, "/b".to_string())]
        );

        for uri in ["/a", "/b"] {
            let res = app.clone().oneshot(request(Method::GET, uri)).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            assert_eq!(body_text(res).await, "ok");
        }
        let res = app.oneshot(request(Method::POST, "/a")).await.unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn methods_share_a_path() {
        let (_, app) = load_app(
            &[
                ("get.toml", "path = \"/items\"\nget = \"ok\"\n"),
                ("post.toml", "path = \"/items\"\npost = \"created\"\n"),
            ],
            RouterOptions::default(),
        )
        .await;

        let res = app.clone().oneshot(request(Method::GET, "/items")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let res = app.oneshot(request(Method::POST, "/items")).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn middlewares_run_in_declared_order() {
        let (_, app) = load_app(
            &[("a.toml", "path = \"/a\"\nget = \"ok\"\ngetMiddlewares = [\"tag_a\", \"tag_b\"]\n")],
            RouterOptions::default(),
        )
        .await;

        let res = app.oneshot(request(Method::GET, "/a")).await.unwrap();
        assert_eq!(res.headers()["x-trail"], "a,b");
    }

    #[tokio::test]
    async fn middleware_can_short_circuit() {
        let (_, app) = load_app(
            &[("a.toml", "path = \"/a\"\nget = \"ok\"\ngetMiddlewares = [\"tag_a\", \"deny\", \"tag_b\"]\n")],
            RouterOptions::default(),
        )
        .await;

        let res = app.oneshot(request(Method::GET, "/a")).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(res.headers()["x-trail"], "a");
    }

    #[tokio::test]
    async fn colon_params_are_routed() {
        let (_, app) =
            load_app(&[("u.toml", "path = \"/users/:id\"\nget = \"ok\"\n")], RouterOptions::default()).await;
        let res = app.oneshot(request(Method::GET, "/users/42")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn prefix_nests_routes() {
        let (_, app) = load_app(
            &[("a.toml", "path = \"/a\"\nget = \"ok\"\n")],
            RouterOptions { prefix: Some("/api".into()) },
        )
        .await;

        let res = app.clone().oneshot(request(Method::GET, "/api/a")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let res = app.oneshot(request(Method::GET, "/a")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_registration_keeps_first() {
        let mut registry = test_registry();
        registry.register_handler("second", handler_fn(|_req| async { "second".into_response() }));
        let first = registry.resolve(&[], "ok").unwrap();
        let second = registry.resolve(&[], "second").unwrap();

        let mut router = RouterMiddleware::new(RouterOptions::default());
        router.register(Method::GET, "/dup", first);
        router.register(Method::GET, "/dup", second);
        assert_eq!(router.registrations().len(), 2);

        let res = router.routes().oneshot(request(Method::GET, "/dup")).await.unwrap();
        assert_eq!(body_text(res).await, "ok");
    }

    #[tokio::test]
    async fn builtins_serve_through_loaded_routes() {
        let mut config = AppConfig::default();
        config.auth.token = Some("s3cret".into());

        let dir = TempDir::new().unwrap();
        write(dir.path(), "health.toml", "path = \"/healthz\"\nget = \"healthz\"\n");
        write(
            dir.path(),
            "echo.toml",
            "path = \"/echo\"\npost = \"echo\"\npostMiddlewares = [\"request_log\", \"security_headers\", \"bearer_auth\"]\n",
        );
        write(dir.path(), "version.json", r#"{"path": "/version", "get": "version"}"#);

        let loader = RouteLoader::new(HandlerRegistry::with_builtins(&config));
        let mut router = RouterMiddleware::new(RouterOptions::default());
        let count = loader.load_routes(&mut router, dir.path(), &LoadOptions::default()).await.unwrap();
        assert_eq!(count, 2);
        let app = router.routes();

        let res = app.clone().oneshot(request(Method::GET, "/healthz")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_text(res).await, "ok");

        let res = app.clone().oneshot(request(Method::POST, "/echo")).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers()["x-content-type-options"], "nosniff");

        let req = Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .header("authorization", "Bearer s3cret")
            .body(Body::from("hello"))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["cache-control"], "no-store");
        let v: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
        assert_eq!(v["method"], "POST");
        assert_eq!(v["uri"], "/echo");
        assert_eq!(v["body"], "hello");
    }

    #[tokio::test]
    async fn version_handler_reports_package() {
        let config = AppConfig::default();
        let registry = HandlerRegistry::with_builtins(&config);
        assert!(registry.resolve(&["bearer_auth".to_string()], "version").is_ok());

        let chain = registry.resolve(&[], "version").unwrap();
        let res = chain.run(request(Method::GET, "/version")).await;
        assert_eq!(res.status(), StatusCode::OK);
        let v: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
        assert_eq!(v["name"], "routewald");
    }

    fn router_with(paths: &[(Method, &str, &str)]) -> RouterMiddleware {
        let registry = test_registry();
        let mut router = RouterMiddleware::new(RouterOptions::default());
        for (method, path, handler) in paths {
            router.register(method.clone(), path, registry.resolve(&[], handler).unwrap());
        }
        router
    }

    #[tokio::test]
    async fn renamed_params_share_one_route() {
        let router = router_with(&[
            (Method::GET, "/users/:id", "ok"),
            (Method::POST, "/users/:userId", "created"),
        ]);
        let app = router.routes();

        let res = app.clone().oneshot(request(Method::GET, "/users/7")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let res = app.oneshot(request(Method::POST, "/users/7")).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn renamed_params_same_method_is_shadowed() {
        let router = router_with(&[
            (Method::GET, "/users/:id", "ok"),
            (Method::GET, "/users/:userId", "created"),
        ]);
        let res = router.routes().oneshot(request(Method::GET, "/users/7")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unroutable_paths_are_skipped_not_fatal() {
        let router = router_with(&[
            (Method::GET, "/static/*/x", "ok"),
            (Method::GET, "/a/:", "ok"),
            (Method::GET, "/b/{id}", "ok"),
            (Method::GET, "/files/*rest", "ok"),
            (Method::GET, "/fine", "ok"),
        ]);
        assert_eq!(router.registrations().len(), 5);
        let app = router.routes();

        let res = app.clone().oneshot(request(Method::GET, "/fine")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let res = app.oneshot(request(Method::GET, "/static/y/x")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wildcard_methods_share_one_route() {
        let router = router_with(&[
            (Method::GET, "/files/*", "ok"),
            (Method::POST, "/files/*", "created"),
            (Method::GET, "/files/*", "created"),
        ]);
        let app = router.routes();
        let res = app.clone().oneshot(request(Method::GET, "/files/a/b")).await.unwrap();
        assert_eq!(body_text(res).await, "ok");
        let res = app.oneshot(request(Method::POST, "/files/a")).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn wildcard_matches_nested_paths() {
        let (_, app) =
            load_app(&[("s.toml", "path = \"/static/*\"\nget = \"ok\"\n")], RouterOptions::default()).await;
        let res = app.clone().oneshot(request(Method::GET, "/static/x/y")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_text(res).await, "ok");
        let res = app.oneshot(request(Method::GET, "/other/x")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn path_list_order_survives_prefix() {
        let (router, app) = load_app(
            &[("a.toml", "path = [\"/b\", \"/a\"]\nget = \"ok\"\npost = \"created\"\n")],
            RouterOptions { prefix: Some("/api".into()) },
        )
        .await;
        assert_eq!(
            router.route_table(),
            vec![
                (Method::GET, "/b".to_string()),
                (Method::GET, "/a".to_string()),
                (Method::POST, "/b".to_string()),
                (Method::POST, "/a".to_string()),
            ]
        );
        for uri in ["/api/b", "/api/a"] {
            let res = app.clone().oneshot(request(Method::GET, uri)).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            let res = app.clone().oneshot(request(Method::POST, uri)).await.unwrap();
            assert_eq!(res.status(), StatusCode::CREATED);
        }
    }

    #[tokio::test]
    async fn echo_rejects_oversized_body() {
        let registry = HandlerRegistry::with_builtins(&AppConfig::default());
        let chain = registry.resolve(&[], "echo").unwrap();

        let req = Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .body(Body::from(vec![b'x'; ECHO_BODY_LIMIT + 1]))
            .unwrap();
        let res = chain.run(req).await;
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let v: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
        assert_eq!(v["error"]["code"], "PAYLOAD_TOO_LARGE");

        let req = Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .header("content-length", (ECHO_BODY_LIMIT + 1).to_string())
            .body(Body::from("short"))
            .unwrap();
        assert_eq!(chain.run(req).await.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
