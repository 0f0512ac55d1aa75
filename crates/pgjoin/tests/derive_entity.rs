use pgjoin::{
    BuildError, DescriptorRegistry, Entity, JoinConfig, QueryJoin, SelectMode, StaticTenant,
};

struct TenantScoped;

#[derive(Entity)]
#[join(table = "user")]
#[allow(dead_code)]
struct User {
    id: i64,
    name: String,
    #[join(column = "roleId")]
    role_id: i64,
}

#[derive(Entity)]
#[join(table = "role")]
#[allow(dead_code)]
struct Role {
    #[join(id)]
    id: i64,
    name: String,
}

#[derive(Entity)]
#[join(table = "sys_user_role", alias = "ur", tenant = TenantScoped)]
#[allow(dead_code)]
struct UserRole {
    #[join(id)]
    user_role_id: i64,
    user_id: i64,
    role_id: i64,
    tenant_id: i64,
    #[join(soft_delete = "0")]
    deleted: i16,
    #[join(skip)]
    note: Option<String>,
}

fn config() -> JoinConfig {
    JoinConfig::new(DescriptorRegistry::discover())
}

#[test]
fn derive_builds_descriptor() {
    let descriptor = UserRole::descriptor();
    assert_eq!(descriptor.entity_name(), "UserRole");
    assert_eq!(descriptor.table_name(), "sys_user_role");
    assert_eq!(descriptor.default_alias(), "ur");
    assert_eq!(descriptor.key().field, "user_role_id");
    assert_eq!(descriptor.column_of("note"), None);
    assert_eq!(
        descriptor.soft_delete_field().map(|f| f.column.as_str()),
        Some("deleted")
    );
    assert_eq!(
        descriptor.tenant_base_type(),
        Some(std::any::TypeId::of::<TenantScoped>())
    );

    let user = User::descriptor();
    assert_eq!(user.default_alias(), "user");
    assert_eq!(user.key().column, "id");
    assert_eq!(user.column_of("role_id"), Some("roleId"));
    assert_eq!(User::ROLE_ID.name(), "role_id");
}

#[test]
fn discover_finds_derived_entities() {
    let registry = DescriptorRegistry::discover();
    assert!(registry.contains::<User>());
    assert!(registry.contains::<Role>());
    assert!(registry.contains::<UserRole>());
}

#[test]
fn left_join_example() {
    let q = QueryJoin::<User>::create(config())
        .unwrap()
        .left_join::<Role>()
        .on(User::ROLE_ID, Role::ID)
        .select_none_tables()
        .select_all::<Role>();

    assert_eq!(
        q.from_clause(),
        "user AS user LEFT JOIN role AS role ON user.roleId = role.id"
    );
    assert_eq!(q.select_clause().unwrap(), "role.id AS id,role.name AS name");
}

#[test]
fn where_join_through_link_table() {
    let config = config()
        .tenant(StaticTenant::new::<TenantScoped>("tenant_id", [42_i64]))
        .soft_delete(true);
    let q = QueryJoin::<User>::create(config)
        .unwrap()
        .where_join::<UserRole>()
        .on(UserRole::USER_ID, User::ID)
        .where_join::<Role>()
        .on(Role::ID, UserRole::ROLE_ID)
        .select_none::<User>()
        .select(Role::NAME)
        .select_as(User::NAME, "user_name")
        .eq(User::ID, 1_i64);

    assert_eq!(q.from_clause(), "user AS user, sys_user_role AS ur, role AS role");
    assert_eq!(
        q.condition_clause().unwrap(),
        "WHERE ur.user_id = user.id AND role.id = ur.role_id AND user.id = $1 \
         AND ur.tenant_id = $2 AND ur.deleted = $3"
    );
    assert_eq!(
        q.full_statement().unwrap(),
        "SELECT user.name AS user_name,role.name AS name \
         FROM user AS user, sys_user_role AS ur, role AS role \
         WHERE ur.user_id = user.id AND role.id = ur.role_id AND user.id = 1 \
         AND ur.tenant_id = 42 AND ur.deleted = 0"
    );
    assert_eq!(
        q.tables().iter().map(|t| t.mode()).collect::<Vec<_>>(),
        [SelectMode::None, SelectMode::None, SelectMode::Some]
    );
}

#[test]
fn unknown_field_constant_is_rejected() {
    let q = QueryJoin::<Role>::create(config())
        .unwrap()
        .eq(pgjoin::Field::<Role>::new("colour"), "red");
    assert!(matches!(
        q.statement(),
        Err(BuildError::UnknownField { .. })
    ));
}
