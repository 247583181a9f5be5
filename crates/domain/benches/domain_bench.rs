use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    Cart, Catalog, CatalogItem, CatalogItemId, Category, CategoryId, ComplementId,
    ComplementOption, ExtraId, ExtraOption, LineItemConfiguration, Money, OrganizationId,
    SelectedComplement, cart_total, identity_key,
};

fn id(value: &str) -> CatalogItemId {
    CatalogItemId::parse(value).unwrap()
}

fn bench_catalog() -> Catalog {
    let pizzas = Category {
        id: CategoryId::parse("pizzas").unwrap(),
        name: "Pizzas".to_string(),
        allows_dual_composite: true,
    };
    let items = (0..50)
        .map(|n| {
            CatalogItem::new(
                id(&format!("pizza-{n}")),
                format!("Pizza {n}"),
                Money::from_cents(3000 + n * 10),
            )
            .in_category(&pizzas)
            .with_extra(ExtraOption {
                id: ExtraId::parse("borda").unwrap(),
                name: "Borda".to_string(),
                price: Money::from_cents(800),
            })
            .with_complement(ComplementOption {
                id: ComplementId::parse("refri").unwrap(),
                name: "Refrigerante".to_string(),
                unit_price: Money::from_cents(600),
                required: false,
                max_items: None,
            })
        })
        .collect();
    Catalog::new(OrganizationId::new(), vec![pizzas], items)
}

fn dual_config(first: usize, second: usize) -> LineItemConfiguration {
    LineItemConfiguration::dual(id(&format!("pizza-{first}")), id(&format!("pizza-{second}")))
        .unwrap()
        .with_extra(ExtraId::parse("borda").unwrap())
        .with_complement(SelectedComplement::new(ComplementId::parse("refri").unwrap(), 2).unwrap()).unwrap()
        .with_note("bem assada")
}

fn bench_identity_key(c: &mut Criterion) {
    let config = dual_config(7, 3);

    c.bench_function("domain/identity_key", |b| {
        b.iter(|| identity_key(&config));
    });
}

fn bench_cart_add(c: &mut Criterion) {
    let configs: Vec<_> = (0..20).map(|n| dual_config(n, n + 1)).collect();

    c.bench_function("domain/cart_add_20_lines_twice", |b| {
        b.iter(|| {
            let mut cart = Cart::new();
            for config in configs.iter().chain(configs.iter()) {
                cart.add(config.clone());
            }
            cart
        });
    });
}

fn bench_cart_total(c: &mut Criterion) {
    let catalog = bench_catalog();
    let mut cart = Cart::new();
    for n in 0..20 {
        cart.add(dual_config(n, n + 1));
    }

    c.bench_function("domain/cart_total_20_lines", |b| {
        b.iter(|| cart_total(&cart, &catalog));
    });
}

criterion_group!(benches, bench_identity_key, bench_cart_add, bench_cart_total);
criterion_main!(benches);
