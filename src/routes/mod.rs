pub mod marketplace;
pub mod order;

pub async fn root() -> &'static str {
    "Hello Render!"
}
