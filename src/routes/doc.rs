use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            ConfirmAccountRequest, LoginRequest, LoginResponse, PasswordResetConfirmRequest,
            PasswordResetRequest, RegisterRequest, UpdateProfileRequest,
        },
        basket::{BasketItemRequest, CreatedCount, DeletedCount, UpdatedCount},
        catalog::{CatalogUrlRequest, ImportSummary},
        common::{DeleteItemsRequest, IdValue},
        contacts::{ContactList, CreateContactRequest, UpdateContactRequest},
        orders::{CheckoutRequest, CheckoutResponse, OrderList},
        products::CategoryList,
    },
    entity::enums::{ContactType, OrderStatus, UserType},
    models::{
        CategoryWithProducts, ContactView, OrderDetail, OrderItemView, ProductListing,
        ProductParameterView, ProductWithListings, ShopRef, UserProfile,
    },
    response::{ApiResponse, ErrorResponse, Meta},
    routes::{auth, basket, catalog, contacts, health, orders, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::confirm,
        auth::login,
        auth::password_reset,
        auth::password_reset_confirm,
        auth::details,
        auth::update_details,
        catalog::upload,
        products::list_products,
        products::get_product,
        basket::view_basket,
        basket::add_to_basket,
        basket::update_basket,
        basket::remove_from_basket,
        orders::list_orders,
        orders::checkout,
        contacts::list_contacts,
        contacts::create_contact,
        contacts::update_contact,
        contacts::delete_contacts
    ),
    components(
        schemas(
            UserType,
            OrderStatus,
            ContactType,
            IdValue,
            RegisterRequest,
            ConfirmAccountRequest,
            LoginRequest,
            LoginResponse,
            PasswordResetRequest,
            PasswordResetConfirmRequest,
            UpdateProfileRequest,
            UserProfile,
            CatalogUrlRequest,
            ImportSummary,
            ShopRef,
            ProductParameterView,
            ProductListing,
            ProductWithListings,
            CategoryWithProducts,
            CategoryList,
            BasketItemRequest,
            CreatedCount,
            UpdatedCount,
            DeletedCount,
            DeleteItemsRequest,
            OrderItemView,
            OrderDetail,
            OrderList,
            CheckoutRequest,
            CheckoutResponse,
            ContactView,
            ContactList,
            CreateContactRequest,
            UpdateContactRequest,
            Meta,
            ErrorResponse,
            health::HealthData,
            ApiResponse<UserProfile>,
            ApiResponse<LoginResponse>,
            ApiResponse<ImportSummary>,
            ApiResponse<CategoryList>,
            ApiResponse<ProductWithListings>,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderList>,
            ApiResponse<CheckoutResponse>,
            ApiResponse<ContactList>,
            ApiResponse<ContactView>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and profile"),
        (name = "Catalog", description = "Shop catalog import"),
        (name = "Products", description = "Product browsing"),
        (name = "Basket", description = "Basket management"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Contacts", description = "Phone and address contacts"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/registration",
            "/api/login",
            "/api/upload",
            "/api/products",
            "/api/product/{id}",
            "/api/basket",
            "/api/orders",
            "/api/contacts",
            "/api/user/details",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
