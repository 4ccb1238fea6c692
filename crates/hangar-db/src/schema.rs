diesel::table! {
    packages (id) {
        id -> Integer,
        owner_id -> BigInt,
        package_type -> Text,
        name -> Text,
        lower_name -> Text,
        created_unix -> BigInt,
    }
}

diesel::table! {
    package_versions (id) {
        id -> Integer,
        package_id -> Integer,
        version -> Text,
        lower_version -> Text,
        metadata_json -> Nullable<Text>,
        created_unix -> BigInt,
    }
}

diesel::table! {
    package_blobs (id) {
        id -> Integer,
        size -> BigInt,
        hash_blake3 -> Text,
        hash_md5 -> Text,
        created_unix -> BigInt,
    }
}

diesel::table! {
    package_files (id) {
        id -> Integer,
        version_id -> Integer,
        blob_id -> Integer,
        name -> Text,
        lower_name -> Text,
        composite_key -> Text,
        is_lead -> Bool,
        created_unix -> BigInt,
    }
}

diesel::table! {
    package_properties (id) {
        id -> Integer,
        ref_type -> Integer,
        ref_id -> Integer,
        name -> Text,
        value -> Text,
    }
}

diesel::joinable!(package_versions -> packages (package_id));
diesel::joinable!(package_files -> package_versions (version_id));
diesel::joinable!(package_files -> package_blobs (blob_id));

diesel::allow_tables_to_appear_in_same_query!(
    packages,
    package_versions,
    package_blobs,
    package_files,
    package_properties,
);
