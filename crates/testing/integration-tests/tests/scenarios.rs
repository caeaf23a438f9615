//! End-to-end behaviour of the static borrow pass on hand-built crates

use expect_test::expect;
use integration_tests::build::*;
use integration_tests::{Fixture, single};
use rv_hir::{
    ArraySize, BorrowKind, ConstGeneric, ConstValue, Constant, CoreType, ExprStage, GenericGroup, GenericParams,
    Path, PathParams, PathValueTarget, SimplePath, Trait, TraitValueItem, TypeItem, TypeRef,
};

#[test]
fn scenario_a_array_literal_is_lifted() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    fx.add_function(
        &root,
        "numbers",
        borrow(array(vec![int(1, CoreType::I32), int(2, CoreType::I32), int(3, CoreType::I32)])),
    );

    let report = fx.run().unwrap();

    assert_eq!(report.promoted, 1);
    assert_eq!(report.total_statics(), 1);
    expect![[r#"
        pub fn numbers = &lifted#0
        pub(none) static lifted#0: [i32; 3] = [1, 2, 3] => [1, 2, 3]
    "#]]
    .assert_eq(&fx.render());
}

#[test]
fn scenario_b_mutable_borrow_is_untouched() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    fx.add_function(
        &root,
        "numbers",
        borrow_mut(array(vec![int(1, CoreType::I32), int(2, CoreType::I32), int(3, CoreType::I32)])),
    );

    let report = fx.run().unwrap();

    assert_eq!(report.promoted, 0);
    assert!(report.statics_per_module.is_empty());
    expect![[r#"
        pub fn numbers = &mut [1, 2, 3]
    "#]]
    .assert_eq(&fx.render());
}

#[test]
fn scenario_c_generic_type_is_untouched() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    let (struct_param, _) = fx.type_param("T", GenericGroup::Impl, 0);
    let tagged = fx.add_struct(
        &root,
        "Tagged",
        GenericParams {
            types: vec![struct_param],
            values: Vec::new(),
        },
        vec![("id", TypeRef::Primitive(CoreType::U32))],
    );
    let id = fx.sym("id");

    let (fn_param, generic) = fx.type_param("T", GenericGroup::Item, 0);
    let generic_path = Fixture::generic_path(&tagged, vec![generic]);
    let generic_literal = struct_literal(
        generic_path.clone(),
        vec![(id, int(7, CoreType::U32))],
        TypeRef::new_struct(generic_path),
    );
    fx.add_generic_function(
        &root,
        "tagged",
        GenericParams {
            types: vec![fn_param],
            values: Vec::new(),
        },
        borrow(generic_literal),
    );

    let concrete_path = Fixture::generic_path(&tagged, vec![TypeRef::Primitive(CoreType::U8)]);
    let concrete_literal = struct_literal(
        concrete_path.clone(),
        vec![(id, int(7, CoreType::U32))],
        TypeRef::new_struct(concrete_path),
    );
    fx.add_function(&root, "concrete", borrow(concrete_literal));

    let report = fx.run().unwrap();

    assert_eq!(report.promoted, 1);
    expect![[r#"
        pub fn tagged = &Tagged::<T> { id: 7 }
        pub fn concrete = &lifted#0
        pub(none) static lifted#0: Tagged::<u8> = Tagged::<u8> { id: 7 } => { id: 7 }
    "#]]
    .assert_eq(&fx.render());
}

#[test]
fn scenario_d_array_size_expression_is_classified() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    let one = fx.sym("1");
    let table = borrow(array(vec![int(1, CoreType::Usize), int(2, CoreType::Usize), int(3, CoreType::Usize)]));
    let size = field(
        tuple(vec![table, int(4, CoreType::Usize)]),
        one,
        TypeRef::Primitive(CoreType::Usize),
    );
    let buffer_ty = TypeRef::Array {
        inner: Box::new(TypeRef::Primitive(CoreType::U8)),
        size: ArraySize::Unevaluated(ConstGeneric::Unevaluated(Box::new(integration_tests::build::root(
            size, &root,
        )))),
    };
    let mut initializer = repeat(int(0, CoreType::U8), 4);
    initializer.ty = buffer_ty;
    fx.add_static(&root, "BUF", initializer);

    let report = fx.run().unwrap();

    assert_eq!(report.promoted, 1);
    expect![[r#"
        pub static BUF: [u8; { (&lifted#0, 4).1 }] = [0; 4]
        pub(none) static lifted#0: [usize; 3] = [1, 2, 3] => [1, 2, 3]
    "#]]
    .assert_eq(&fx.render());
}

#[test]
fn scenario_e_borrow_of_constant_reads_through() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    let limits = fx.add_constant(
        &root,
        "LIMITS",
        array(vec![int(10, CoreType::U32), int(20, CoreType::U32)]),
    );
    let limits_ty = TypeRef::new_array(TypeRef::Primitive(CoreType::U32), 2);
    fx.add_function(
        &root,
        "limits",
        borrow(path_value(limits, limits_ty, PathValueTarget::Constant)),
    );

    let report = fx.run().unwrap();

    assert_eq!(report.promoted, 1);
    expect![[r#"
        pub const LIMITS: [u32; 2] = [10, 20]
        pub fn limits = &lifted#0
        pub(none) static lifted#0: [u32; 2] = LIMITS => [10, 20]
    "#]]
    .assert_eq(&fx.render());
}

#[test]
fn interior_mutable_types_are_untouched() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    let cell = fx.add_unsafe_cell();
    let cell_path = Fixture::generic_path(&cell, vec![TypeRef::Primitive(CoreType::U32)]);
    let cell_ty = TypeRef::new_struct(cell_path.clone());
    let counter = fx.add_struct(&root, "Counter", GenericParams::default(), vec![("cell", cell_ty.clone())]);
    let counter_path = Fixture::generic_path(&counter, Vec::new());
    let (value, cell_field) = (fx.sym("value"), fx.sym("cell"));

    let make_cell = || struct_literal(cell_path.clone(), vec![(value, int(0, CoreType::U32))], cell_ty.clone());
    fx.add_function(&root, "cell", borrow(make_cell()));
    fx.add_function(
        &root,
        "counter",
        borrow(struct_literal(
            counter_path.clone(),
            vec![(cell_field, make_cell())],
            TypeRef::new_struct(counter_path),
        )),
    );

    let opaque_path = Fixture::generic_path(&fx.path(&["Opaque"]), Vec::new());
    fx.add_function(
        &root,
        "opaque",
        borrow(struct_literal(opaque_path.clone(), Vec::new(), TypeRef::new_struct(opaque_path))),
    );

    let report = fx.run().unwrap();

    assert_eq!(report.promoted, 0);
    expect![[r#"
        pub fn cell = &UnsafeCell::<u32> { value: 0 }
        pub fn counter = &Counter { cell: UnsafeCell::<u32> { value: 0 } }
        pub fn opaque = &Opaque {}
    "#]]
    .assert_eq(&fx.render());
}

#[test]
fn names_count_up_per_module() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    let inner = fx.add_module(&root, "inner");
    fx.add_function(&inner, "c", borrow(int(4, CoreType::U8)));
    fx.add_function(&root, "a", borrow(int(1, CoreType::U8)));
    fx.add_function(
        &root,
        "b",
        tuple(vec![borrow(int(2, CoreType::U8)), borrow(int(3, CoreType::U8))]),
    );

    let report = fx.run().unwrap();

    assert_eq!(report.promoted, 4);
    let counts: Vec<usize> = report.statics_per_module.values().copied().collect();
    assert_eq!(counts, vec![1, 3]);
    assert_eq!(report.statics_per_module.get(&inner), Some(&1));
    expect![[r#"
        pub mod inner {
            pub fn c = &inner::lifted#0
            pub(none) static lifted#0: u8 = 4 => 4
        }
        pub fn a = &lifted#0
        pub fn b = (&lifted#1, &lifted#2)
        pub(none) static lifted#0: u8 = 1 => 1
        pub(none) static lifted#1: u8 = 2 => 2
        pub(none) static lifted#2: u8 = 3 => 3
    "#]]
    .assert_eq(&fx.render());
}

#[test]
fn nested_borrows_lift_inner_value_first() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    fx.add_function(
        &root,
        "nested",
        borrow(tuple(vec![borrow(int(1, CoreType::U8)), int(2, CoreType::U8)])),
    );

    let report = fx.run().unwrap();

    assert_eq!(report.promoted, 2);
    expect![[r#"
        pub fn nested = &lifted#1
        pub(none) static lifted#0: u8 = 1 => 1
        pub(none) static lifted#1: (&u8, u8) = (&lifted#0, 2) => (&lifted#0, 2)
    "#]]
    .assert_eq(&fx.render());
}

#[test]
fn second_run_changes_nothing() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    let inner = fx.add_module(&root, "inner");
    fx.add_function(
        &root,
        "nested",
        borrow(tuple(vec![borrow(int(1, CoreType::U8)), int(2, CoreType::U8)])),
    );
    fx.add_function(&inner, "slice", borrow(unsize_to_slice(array(vec![int(5, CoreType::I64)]))));
    fx.run().unwrap();
    let after_first = fx.render();

    let report = fx.run().unwrap();

    assert_eq!(report.promoted, 0);
    assert_eq!(report.total_statics(), 0);
    assert_eq!(fx.render(), after_first);
}

#[test]
fn unsize_wrapper_stays_around_reference() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    fx.add_function(
        &root,
        "slice",
        borrow(unsize_to_slice(array(vec![int(1, CoreType::I32), int(2, CoreType::I32)]))),
    );

    fx.run().unwrap();

    expect![[r#"
        pub fn slice = &(lifted#0 : [i32])
        pub(none) static lifted#0: [i32; 2] = [1, 2] => [1, 2]
    "#]]
    .assert_eq(&fx.render());
}

#[test]
fn non_constant_operands_block_promotion() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    let table = fx.add_static(&root, "TABLE", array(vec![int(1, CoreType::U8)]));
    let table_ty = TypeRef::new_array(TypeRef::Primitive(CoreType::U8), 1);
    fx.add_function(
        &root,
        "table",
        borrow(path_value(table, table_ty, PathValueTarget::Static)),
    );
    let x = fx.sym("x");
    fx.add_function(
        &root,
        "local",
        borrow(array(vec![variable(x, 0, TypeRef::Primitive(CoreType::U8)), int(1, CoreType::U8)])),
    );

    let report = fx.run().unwrap();

    assert_eq!(report.promoted, 0);
    expect![[r#"
        pub static TABLE: [u8; 1] = [1]
        pub fn table = &TABLE
        pub fn local = &[x, 1]
    "#]]
    .assert_eq(&fx.render());
}

#[test]
fn borrows_under_opaque_nodes_are_still_lifted() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    let helper = fx.path(&["helper"]);
    let argument = borrow(array(vec![boolean(true), boolean(false)]));
    fx.add_function(&root, "caller", call(helper, vec![argument], TypeRef::unit()));

    let report = fx.run().unwrap();

    assert_eq!(report.promoted, 1);
    expect![[r#"
        pub fn caller = helper(&lifted#0)
        pub(none) static lifted#0: [bool; 2] = [true, false] => [true, false]
    "#]]
    .assert_eq(&fx.render());
}

#[test]
fn lifted_value_gets_typechecked_state() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    let inner = fx.add_module(&root, "inner");
    fx.add_function(&inner, "answer", borrow(int(42, CoreType::U64)));

    fx.run().unwrap();

    let lifted = fx.static_at(&fx.path(&["inner", "lifted#0"]));
    let state = lifted.value.as_ref().and_then(|value| value.state.as_ref()).unwrap();
    assert_eq!(state.stage, ExprStage::Typecheck);
    assert_eq!(state.module, inner);
    assert!(lifted.value_generated);
    assert!(!lifted.is_mut);
    assert!(lifted.value.as_ref().unwrap().bindings.is_empty());
}

#[test]
fn constant_read_before_its_own_lift_still_evaluates() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    let pair_ty = TypeRef::new_array(TypeRef::Primitive(CoreType::I32), 2);
    let ref_ty = TypeRef::new_borrow(BorrowKind::Shared, pair_ty);
    let pair = fx.path(&["PAIR"]);
    fx.add_function(&root, "reader", borrow(path_value(pair, ref_ty, PathValueTarget::Constant)));
    fx.add_constant(&root, "PAIR", borrow(array(vec![int(1, CoreType::I32), int(2, CoreType::I32)])));

    let report = fx.run().unwrap();

    assert_eq!(report.promoted, 2);
    expect![[r#"
        pub fn reader = &lifted#0
        pub const PAIR: &[i32; 2] = &lifted#1
        pub(none) static lifted#0: &[i32; 2] = PAIR => &lifted#1
        pub(none) static lifted#1: [i32; 2] = [1, 2] => [1, 2]
    "#]]
    .assert_eq(&fx.render());
}

#[test]
fn long_repeat_array_is_lifted() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    fx.add_function(&root, "zeros", borrow(repeat(int(0, CoreType::U8), 2_000_000)));

    let report = fx.run().unwrap();

    assert_eq!(report.promoted, 1);
    let lifted = fx.static_at(&fx.path(&["lifted#0"]));
    assert_eq!(
        lifted.value_res,
        Some(ConstValue::Repeat {
            value: Box::new(ConstValue::Int(0)),
            len: 2_000_000,
        })
    );
    expect![[r#"
        pub fn zeros = &lifted#0
        pub(none) static lifted#0: [u8; 2000000] = [0; 2000000] => [0; 2000000]
    "#]]
    .assert_eq(&fx.render());
}

#[test]
fn u128_values_keep_their_magnitude() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    fx.add_function(&root, "max", borrow(array(vec![int(u128::MAX, CoreType::U128)])));

    fx.run().unwrap();

    let lifted = fx.static_at(&fx.path(&["lifted#0"]));
    assert_eq!(lifted.value_res, Some(ConstValue::Array(vec![ConstValue::UInt(u128::MAX)])));
    expect![[r#"
        pub fn max = &lifted#0
        pub(none) static lifted#0: [u128; 1] = [340282366920938463463374607431768211455] => [340282366920938463463374607431768211455]
    "#]]
    .assert_eq(&fx.render());
}

#[test]
fn generic_value_path_with_concrete_type_is_untouched() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    let count = fx.sym("N");
    let default = Constant::new(
        TypeRef::Primitive(CoreType::U32),
        integration_tests::build::root(int(3, CoreType::U32), &root),
    );
    let counted = fx.add_type(
        &root,
        "Counted",
        TypeItem::Trait(Trait {
            params: GenericParams::default(),
            values: single(count, TraitValueItem::Constant(default)),
        }),
    );
    let assoc = |ty: TypeRef| Path::UfcsKnown {
        ty: Box::new(ty),
        trait_path: Fixture::generic_path(&counted, Vec::new()),
        item: count,
        params: PathParams::default(),
    };
    let u32_ty = TypeRef::Primitive(CoreType::U32);

    let (param, generic) = fx.type_param("T", GenericGroup::Item, 0);
    let generic_count = array(vec![path_value(assoc(generic), u32_ty.clone(), PathValueTarget::Constant)]);
    assert!(!generic_count.ty.contains_generics());
    fx.add_generic_function(
        &root,
        "generic",
        GenericParams {
            types: vec![param],
            values: Vec::new(),
        },
        borrow(generic_count),
    );
    let concrete = path_value(assoc(TypeRef::Primitive(CoreType::U8)), u32_ty, PathValueTarget::Constant);
    fx.add_function(&root, "concrete", borrow(array(vec![concrete])));

    let report = fx.run().unwrap();

    assert_eq!(report.promoted, 1);
    expect![[r#"
        pub fn generic = &[<T as Counted>::N]
        pub fn concrete = &lifted#0
        pub(none) static lifted#0: [u32; 1] = [<u8 as Counted>::N] => [3]
    "#]]
    .assert_eq(&fx.render());
}

#[test]
fn function_items_are_lifted() {
    let mut fx = Fixture::new();
    let root = SimplePath::root();
    let helper = fx.add_function(&root, "helper", tuple(Vec::new()));
    let fn_ty = TypeRef::Function {
        args: Vec::new(),
        ret: Box::new(TypeRef::unit()),
    };
    fx.add_function(
        &root,
        "pointer",
        borrow(path_value(helper.clone(), fn_ty.clone(), PathValueTarget::Function)),
    );

    let (param, generic) = fx.type_param("T", GenericGroup::Item, 0);
    let instance = Fixture::generic_path(&helper, vec![generic]);
    fx.add_generic_function(
        &root,
        "instance",
        GenericParams {
            types: vec![param],
            values: Vec::new(),
        },
        borrow(path_value(instance, fn_ty, PathValueTarget::Function)),
    );

    let report = fx.run().unwrap();

    assert_eq!(report.promoted, 1);
    let lifted = fx.static_at(&fx.path(&["lifted#0"]));
    assert_eq!(lifted.value_res, Some(ConstValue::FnPtr(Path::from(helper))));
    expect![[r#"
        pub fn helper = ()
        pub fn pointer = &lifted#0
        pub fn instance = &helper::<T>
        pub(none) static lifted#0: fn() -> () = helper => fn helper
    "#]]
    .assert_eq(&fx.render());
}
