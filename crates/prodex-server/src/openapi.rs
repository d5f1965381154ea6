use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Prodex API",
        version = "0.1.0",
        description = "Extracts structured product data from product URLs using OpenAI."
    ),
    paths(crate::routes::parse_product, crate::routes::root),
    components(schemas(
        crate::dto::ParseProductRequest,
        crate::dto::ProductResponse,
        crate::dto::PricingResponse,
        crate::dto::RootResponse,
        crate::dto::EndpointsResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "products", description = "Product data extraction"),
        (name = "system", description = "Service information"),
    )
)]
pub struct ApiDoc;
