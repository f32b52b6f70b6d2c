use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use models::user::UserRole;
use service::auth::service::{AuthService, AuthConfig};
use service::auth::repository::mock::MockAuthRepository;
use service::auth::domain::{RegisterInput, LoginInput};

fn bench_login(c: &mut Criterion) {
    let repo = Arc::new(MockAuthRepository::default());
    let svc = AuthService::new(repo.clone(), AuthConfig { jwt_secret: Some("secret".into()), ..AuthConfig::default() });

    // pre-create user outside of the benchmark using a tokio runtime
    let rt = tokio::runtime::Runtime::new().unwrap();
    let _ = rt.block_on(svc.register(RegisterInput {
        email: "bench@example.com".into(),
        password: "Benchmark1".into(),
        first_name: "Bench".into(),
        last_name: "Mark".into(),
        role: UserRole::Distributor,
        company_name: Some("Bench Store".into()),
    }));

    c.bench_function("auth_login_verify", |b| {
        b.iter(|| {
            let _ = rt.block_on(svc.login(LoginInput { email: "bench@example.com".into(), password: "Benchmark1".into() })).unwrap();
        });
    });
}

fn bench_qr_render(c: &mut Criterion) {
    c.bench_function("qr_render_png", |b| {
        b.iter(|| service::qr_image::render_png("http://localhost:8080/shop/ABCD1234").unwrap());
    });
}

criterion_group!(benches, bench_login, bench_qr_render);
criterion_main!(benches);
