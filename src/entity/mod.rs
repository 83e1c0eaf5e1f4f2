pub mod carts;
pub mod cart_items;
pub mod categories;
pub mod notifications;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod smart_list_items;
pub mod smart_lists;
pub mod users;

pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use categories::Entity as Categories;
pub use notifications::Entity as Notifications;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use smart_list_items::Entity as SmartListItems;
pub use smart_lists::Entity as SmartLists;
pub use users::Entity as Users;
