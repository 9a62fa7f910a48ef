use propcontract::prelude::*;
use propcontract::contract::resolve;
use propcontract::testing::{serializer_with_fixtures, Person};
use proptest::prelude::*;

fn null_handling() -> impl Strategy<Value = NullValueHandling> {
    prop_oneof![
        Just(NullValueHandling::Include),
        Just(NullValueHandling::Ignore)
    ]
}

fn required() -> impl Strategy<Value = Required> {
    prop_oneof![
        Just(Required::Default),
        Just(Required::AllowNull),
        Just(Required::Always),
        Just(Required::DisallowNull)
    ]
}

fn default_handling() -> impl Strategy<Value = DefaultValueHandling> {
    prop_oneof![
        Just(DefaultValueHandling::Include),
        Just(DefaultValueHandling::Ignore),
        Just(DefaultValueHandling::Populate),
        Just(DefaultValueHandling::IgnoreAndPopulate)
    ]
}

fn loop_handling() -> impl Strategy<Value = ReferenceLoopHandling> {
    prop_oneof![
        Just(ReferenceLoopHandling::Error),
        Just(ReferenceLoopHandling::Ignore),
        Just(ReferenceLoopHandling::Serialize)
    ]
}

fn creation_handling() -> impl Strategy<Value = ObjectCreationHandling> {
    prop_oneof![
        Just(ObjectCreationHandling::Auto),
        Just(ObjectCreationHandling::Reuse),
        Just(ObjectCreationHandling::Replace)
    ]
}

fn type_name_handling() -> impl Strategy<Value = TypeNameHandling> {
    prop_oneof![
        Just(TypeNameHandling::None),
        Just(TypeNameHandling::Objects),
        Just(TypeNameHandling::Arrays),
        Just(TypeNameHandling::All),
        Just(TypeNameHandling::Auto)
    ]
}

/// Member, type and global values for one policy.
type Tiers<T> = (Option<T>, Option<T>, T);

fn tiers<S: Strategy>(make: fn() -> S) -> impl Strategy<Value = Tiers<S::Value>> {
    (
        proptest::option::of(make()),
        proptest::option::of(make()),
        make(),
    )
}

fn expected<T: Copy>((member, type_default, global): Tiers<T>) -> T {
    member.or(type_default).unwrap_or(global)
}

proptest! {
    #[test]
    fn first_present_tier_wins(member in any::<Option<u8>>(), type_default in any::<Option<u8>>(), global in any::<u8>()) {
        let resolved = resolve(member, type_default, global);
        match (member, type_default) {
            (Some(value), _) => {
                prop_assert_eq!(resolved.value, value);
                prop_assert_eq!(resolved.tier, PolicyTier::Member);
            }
            (None, Some(value)) => {
                prop_assert_eq!(resolved.value, value);
                prop_assert_eq!(resolved.tier, PolicyTier::Type);
            }
            (None, None) => {
                prop_assert_eq!(resolved.value, global);
                prop_assert_eq!(resolved.tier, PolicyTier::Global);
            }
        }
    }

    #[test]
    fn resolver_agrees_with_tiers(
        null in tiers(null_handling),
        req in tiers(required),
        defaulting in tiers(default_handling),
        looping in tiers(loop_handling),
        creation in tiers(creation_handling),
        type_names in tiers(type_name_handling),
        reference in tiers(any::<bool>)
    ) {
        let mut property = PropertyContract::new("field", DeclaredType::String);
        property.null_value_handling = null.0;
        property.required = req.0;
        property.default_value_handling = defaulting.0;
        property.reference_loop_handling = looping.0;
        property.object_creation_handling = creation.0;
        property.type_name_handling = type_names.0;
        property.is_reference = reference.0;

        let defaults = TypeDefaults {
            required: req.1,
            null_value_handling: null.1,
            default_value_handling: defaulting.1,
            reference_loop_handling: looping.1,
            object_creation_handling: creation.1,
            type_name_handling: type_names.1,
            is_reference: reference.1,
        };

        let settings = SerializerSettings::new()
            .with_null_value_handling(null.2)
            .with_required(req.2)
            .with_default_value_handling(defaulting.2)
            .with_reference_loop_handling(looping.2)
            .with_object_creation_handling(creation.2)
            .with_type_name_handling(type_names.2)
            .with_preserve_references(reference.2);

        let resolver = PolicyResolver::new(&property, &defaults, &settings);
        prop_assert_eq!(resolver.null_value_handling().value, expected(null));
        prop_assert_eq!(resolver.required().value, expected(req));
        prop_assert_eq!(resolver.default_value_handling().value, expected(defaulting));
        prop_assert_eq!(resolver.reference_loop_handling().value, expected(looping));
        prop_assert_eq!(resolver.object_creation_handling().value, expected(creation));
        prop_assert_eq!(resolver.type_name_handling().value, expected(type_names));
        prop_assert_eq!(resolver.is_reference().value, expected(reference));

        let effective = resolver.effective();
        prop_assert_eq!(effective.type_name_handling.value, expected(type_names));
        prop_assert_eq!(effective.is_reference.value, expected(reference));
    }

    #[test]
    fn person_survives_a_round_trip(name in "[A-Za-z ]{1,24}", age in any::<i64>(), email in proptest::option::of("[a-z]{1,8}@[a-z]{1,8}\\.org")) {
        let serializer = serializer_with_fixtures(SerializerSettings::default());
        let mut original = Person::new(name, age);
        original.email = email;

        let json = serializer.serialize(&ObjectRef::new(original.clone())).unwrap();
        let restored = serializer.deserialize_as::<Person>(&json).unwrap();
        prop_assert_eq!(restored.with(|p: &Person| p.clone()), Some(original));
    }
}
