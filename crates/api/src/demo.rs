//! Demo restaurant served when no database is configured.

use common::{CustomerId, OrganizationId};
use domain::catalog::{CategoryRecord, ComplementRecord, ExtraRecord, ProductRecord};
use uuid::Uuid;

/// Fixed so links keep working across restarts.
pub const DEMO_ORGANIZATION: Uuid = Uuid::from_u128(0x6d0c_1a2e_5b7f_4c3d_9e8a_0f1b_2c3d_4e5f);
pub const DEMO_CUSTOMER: Uuid = Uuid::from_u128(0x3f9a_8b7c_6d5e_4f10_a1b2_c3d4_e5f6_a7b8);
/// Access token that opens an order for the demo customer.
pub const DEMO_ACCESS_TOKEN: &str = "demo-token";

pub fn organization() -> OrganizationId {
    OrganizationId::from_uuid(DEMO_ORGANIZATION)
}

pub fn customer() -> CustomerId {
    CustomerId::from_uuid(DEMO_CUSTOMER)
}

fn category(id: &str, name: &str, allows_dual_composite: bool) -> CategoryRecord {
    CategoryRecord {
        id: id.to_string(),
        name: Some(name.to_string()),
        allows_dual_composite: Some(allows_dual_composite),
        active: Some(true),
    }
}

fn product(id: &str, name: &str, description: &str, category: &str, price: f64) -> ProductRecord {
    ProductRecord {
        id: id.to_string(),
        name: Some(name.to_string()),
        description: Some(description.to_string()),
        category_id: Some(category.to_string()),
        price: Some(price),
        active: Some(true),
        extras: Vec::new(),
        complements: Vec::new(),
    }
}

fn extra(id: &str, name: &str, price: f64) -> ExtraRecord {
    ExtraRecord {
        id: id.to_string(),
        name: Some(name.to_string()),
        price: Some(price),
    }
}

fn complement(id: &str, name: &str, price: f64, max_items: i64) -> ComplementRecord {
    ComplementRecord {
        id: id.to_string(),
        name: Some(name.to_string()),
        price: Some(price),
        required: Some(false),
        max_items: Some(max_items),
    }
}

pub fn categories() -> Vec<CategoryRecord> {
    vec![
        category("hamburgueres", "Hambúrgueres", false),
        category("pizzas", "Pizzas", true),
        category("saladas", "Saladas", false),
        category("massas", "Massas", false),
    ]
}

pub fn products() -> Vec<ProductRecord> {
    let burger_extras = || {
        vec![
            extra("bacon-extra", "Bacon extra", 4.00),
            extra("queijo-extra", "Queijo extra", 3.00),
        ]
    };
    let pizza_extras = || vec![extra("borda-catupiry", "Borda de catupiry", 6.00)];
    let drinks = || vec![complement("refrigerante", "Refrigerante lata", 6.00, 3)];

    let mut menu = vec![
        product(
            "hamburguer-artesanal",
            "Hambúrguer Artesanal",
            "Pão brioche, carne bovina 180g, queijo cheddar, alface, tomate, cebola roxa e molho especial da casa",
            "hamburgueres",
            24.90,
        ),
        product(
            "pizza-margherita",
            "Pizza Margherita",
            "Molho de tomate artesanal, mussarela fresca, manjericão e azeite extra virgem",
            "pizzas",
            32.90,
        ),
        product(
            "salada-caesar",
            "Salada Caesar",
            "Mix de folhas verdes, croutons crocantes, lascas de parmesão e molho caesar cremoso",
            "saladas",
            19.90,
        ),
        product(
            "pasta-carbonara",
            "Pasta Carbonara",
            "Espaguete al dente, bacon crocante, ovos frescos, queijo parmesão e pimenta do reino",
            "massas",
            28.90,
        ),
        product(
            "hamburguer-bacon",
            "Hambúrguer Bacon",
            "Pão artesanal, carne bovina 200g, bacon crocante, queijo swiss, alface e molho barbecue",
            "hamburgueres",
            27.90,
        ),
        product(
            "pizza-pepperoni",
            "Pizza Pepperoni",
            "Molho de tomate temperado, mussarela, pepperoni italiano e orégano",
            "pizzas",
            35.90,
        ),
        product(
            "salada-tropical",
            "Salada Tropical",
            "Mix de folhas, manga, abacaxi, nozes, queijo de cabra e vinagrete de maracujá",
            "saladas",
            22.90,
        ),
        product(
            "pasta-pesto",
            "Pasta Pesto",
            "Penne com molho pesto de manjericão fresco, tomates secos e lascas de parmesão",
            "massas",
            25.90,
        ),
    ];

    for item in &mut menu {
        match item.category_id.as_deref() {
            Some("hamburgueres") => item.extras = burger_extras(),
            Some("pizzas") => {
                item.extras = pizza_extras();
                item.complements = drinks();
            }
            _ => {}
        }
    }
    menu
}
