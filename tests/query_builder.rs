use pretty_assertions::assert_eq;
use tabula::prelude::*;

fn users() -> Table {
    let mut t = Table::new("users").unwrap();
    t.add_column("id", ColumnSpec::new("int").size(11).primary().auto_increment())
        .unwrap();
    t.add_column("email", ColumnSpec::new("varchar").size(128)).unwrap();
    t
}

#[test]
fn test_sizes_per_datatype() {
    let cases: &[(&str, i64, DataType, u32)] = &[
        ("int", 5, DataType::Int, 5),
        ("int", 50, DataType::Int, 11),
        ("varchar", 128, DataType::Varchar, 128),
        ("varchar", 30000, DataType::MediumText, 30000),
        ("text", 21845, DataType::Text, 21845),
        ("char", 255, DataType::Char, 255),
        ("decimal", 12, DataType::Decimal, 12),
        ("bit", 8, DataType::Bit, 8),
    ];
    for (datatype, size, expected_type, expected_size) in cases {
        let col = Column::new("c", datatype, Some(*size)).unwrap();
        assert_eq!(col.datatype(), *expected_type, "{} {}", datatype, size);
        assert_eq!(col.size(), *expected_size, "{} {}", datatype, size);
    }

    assert!(Column::new("c", "char", Some(256)).is_err());
    assert!(Column::new("c", "bit", Some(65)).is_err());
    let mut col = Column::new("c", "blob", None).unwrap();
    assert_eq!(
        col.set_size(10),
        Err(TabulaError::SizeNotSupported("blob".into()))
    );
}

#[test]
fn test_create_table_keeps_column_order() {
    let mut t = Table::new("log").unwrap();
    let keys = ["a", "b", "c", "d", "e"];
    for key in keys {
        t.add_column(key, ColumnSpec::new("int")).unwrap();
    }
    let sql = Query::new(t).create_table(&CreateOptions::default());

    let column_lines: Vec<&str> = sql.lines().filter(|l| l.starts_with("  `")).collect();
    assert_eq!(column_lines.len(), keys.len());
    for (line, key) in column_lines.iter().zip(keys) {
        assert!(line.starts_with(&format!("  `{}` ", key)), "{}", line);
    }
}

#[test]
fn test_users_scenario() {
    let mut query = Query::new(users());
    let sql = query.create_table(&CreateOptions::default());
    let id = sql
        .find("`id` int(11) not null primary key auto_increment")
        .expect("id definition");
    let email = sql
        .find("`email` varchar(128) not null collate utf8mb4_unicode_ci")
        .expect("email definition");
    assert!(id < email);

    let sql = query.insert_record(&Record::new().set("email", "o'brien@example.com"));
    assert_eq!(
        sql,
        "insert into `users` (`email`) values ('o\\'brien@example.com');"
    );
}

#[test]
fn test_default_columns_once() {
    let mut t = users();
    // `id` is already taken, so only the two date columns go in.
    assert_eq!(t.add_default_cols(&DefaultColumns::default()), 2);
    assert_eq!(t.add_default_cols(&DefaultColumns::default()), 0);
    let keys: Vec<_> = t.keys().collect();
    assert_eq!(keys, vec!["id", "email", "created_on", "last_updated"]);
}

#[test]
fn test_join_exposes_prefixed_columns() {
    let mut orders = Table::new("orders").unwrap();
    orders.add_column("id", ColumnSpec::new("int").primary()).unwrap();
    orders.add_column("email", ColumnSpec::new("varchar(128)")).unwrap();
    orders.add_column("user_id", ColumnSpec::new("int")).unwrap();

    let join = JoinTable::new(users(), orders.clone(), JoinType::Left, &JoinAliases::default());
    for name in ["id", "email"] {
        assert!(join.table().has_col(format!("left_{}", name)));
        assert!(join.table().has_col(format!("right_{}", name)));
        assert!(!join.table().has_col(name));
    }

    let mut aliases = JoinAliases::default();
    aliases.right.insert("email".into(), "order_email".into());
    let join = JoinTable::new(users(), orders, JoinType::Left, &aliases);
    assert!(join.table().has_col("left_email"));
    assert!(join.table().has_col("order_email"));
    assert!(!join.table().has_col("right_email"));
}

#[test]
fn test_select_over_join() {
    let mut orders = Table::new("orders").unwrap();
    orders.add_column("id", ColumnSpec::new("int").primary()).unwrap();
    orders.add_column("user_id", ColumnSpec::new("int")).unwrap();

    let mut query = Query::new(users()).join(
        orders,
        &JoinOptions::new(JoinType::Inner).on("id", "user_id"),
    );
    let sql = query.select(
        &SelectOptions::new()
            .column("email")
            .column("right_id")
            .filter(Where::new().eq("user_id", 4))
            .order_by("email", "asc"),
    );
    assert_eq!(
        sql,
        "select `users`.`email`, `orders`.`id` as `right_id` from `users` join `orders` \
         on `users`.`id` = `orders`.`user_id` where `orders`.`user_id` = 4 \
         order by `users`.`email` asc;"
    );

    let sql = query.select(&SelectOptions::new());
    assert!(sql.starts_with(
        "select `users`.`id` as `left_id`, `users`.`email`, `orders`.`id` as `right_id`, `orders`.`user_id` from"
    ));
}

#[test]
fn test_datetime_equality_is_a_range() {
    let mut t = Table::new("events").unwrap();
    t.add_column("starts_at", ColumnSpec::new("datetime")).unwrap();
    let mut query = Query::new(t);
    let sql = query.select(
        &SelectOptions::new().filter(Where::new().eq("starts_at", "2023-05-01 10:00:00")),
    );
    assert!(sql.contains(">= '2023-05-01 10:00:00' and `starts_at` <= '2023-05-01 23:59:59'"));
}

#[test]
fn test_foreign_key_type_mismatch() {
    let mut customers = Table::new("customers").unwrap();
    customers.add_column("id", ColumnSpec::new("varchar(36)").primary()).unwrap();
    let mut orders = Table::new("orders").unwrap();
    orders.add_column("customer_id", ColumnSpec::new("int")).unwrap();

    let mut fk = ForeignKey::with_tables("fk_orders_customer", &orders, &customers).unwrap();
    assert!(!fk.add_reference("customer_id", "id"));
    assert!(fk.owner_columns().is_empty());
    assert!(!orders.add_foreign_key(fk));
    assert!(!orders.add_reference("customer_id", &customers, "id", None, None));
}

#[test]
fn test_foreign_key_statement() {
    let mut orders = Table::new("orders").unwrap();
    orders.add_column("user_id", ColumnSpec::new("int")).unwrap();
    let mut fk = ForeignKey::with_tables("fk_orders_user", &orders, &users()).unwrap();
    assert!(fk.add_reference("user_id", "id"));
    fk.set_on_delete(Some(ReferenceAction::SetNull));

    let mut query = Query::new(orders);
    assert_eq!(
        query.add_foreign_key(&fk),
        "alter table `orders` add constraint `fk_orders_user` foreign key (`user_id`) \
         references `users`(`id`) on delete set null;"
    );
    assert_eq!(query.query_type(), Some(QueryType::Alter));
}

#[test]
fn test_select_max_skips_limit() {
    let mut t = Table::new("products").unwrap();
    t.add_column("price", ColumnSpec::new("decimal(10,2)")).unwrap();
    let mut query = Query::new(t);
    let options = SelectOptions::new().limit(10).offset(5);
    assert_eq!(
        query.select_max("price", Some("highest"), &options),
        "select max(`price`) as `highest` from `products`;"
    );
}

#[test]
fn test_parsed_filter_drives_update() {
    let mut t = users();
    t.add_default_cols(&DefaultColumns::default());
    let mut query = Query::new(t);
    let filter = parse_filter("id in (1, 2) or email = 'a@x.io'").unwrap();
    assert_eq!(
        query.update_record(&Record::new().set("email", "b@x.io"), &filter),
        "update `users` set `email` = 'b@x.io', `last_updated` = now() \
         where `id` in (1, 2) or `email` = 'a@x.io';"
    );
}

#[test]
fn test_schema_file_to_sql() {
    let schema = SchemaFile::from_toml(
        r#"
[[tables]]
name = "tags"
default-columns = ["id"]

[[tables.columns]]
key = "label"
datatype = "varchar(32)"
is-unique = true
"#,
    )
    .unwrap();
    let config = TabulaConfig::builder().mysql_version(5.5).build();
    let tables = schema.build(&config).unwrap();
    let sql = Query::new(tables[0].clone()).create_table(&CreateOptions::default());
    assert_eq!(
        sql,
        "create table `tags` (\n  `id` int(11) not null primary key auto_increment,\n  \
         `label` varchar(32) not null unique collate utf8_general_ci\n) engine = InnoDB \
         default charset = utf8 collate = utf8_general_ci;"
    );
}
