//! Unit tests for agv-core.

#[cfg(test)]
mod helpers {
    use crate::{Block, Path, PlantModel, PlantModelBuilder, Point};

    /// Two points joined by one path, with a block spanning the path and its
    /// destination point.
    pub fn small_model() -> PlantModel {
        let mut b = PlantModelBuilder::new();
        b.add_point(Point::new("A"))
            .add_point(Point::new("B"))
            .add_path(Path::new("A--B", "A", "B", 1_000))
            .add_block(Block::new("block1").with_member("A--B").with_member("B"));
        b.build().unwrap()
    }
}

#[cfg(test)]
mod cost {
    use crate::{weight_to_cost, INFINITE_COSTS, INFINITE_WEIGHT};

    #[test]
    fn finite_weights_round() {
        assert_eq!(weight_to_cost(0.0), 0);
        assert_eq!(weight_to_cost(10.0), 10);
        assert_eq!(weight_to_cost(19.5), 20);
    }

    #[test]
    fn infinite_weight_maps_to_sentinel() {
        assert_eq!(weight_to_cost(INFINITE_WEIGHT), INFINITE_COSTS);
        assert_eq!(weight_to_cost(f64::NAN), INFINITE_COSTS);
    }

    #[test]
    fn oversized_weight_saturates() {
        assert_eq!(weight_to_cost(1e300), INFINITE_COSTS);
    }
}

#[cfg(test)]
mod model {
    use crate::properties::ROUTING_GROUP_KEY;
    use crate::{Path, Point, Position, Vehicle};

    #[test]
    fn point_identity_by_name() {
        let a = Point::new("A");
        let a2 = Point::new("A").with_position(Position::new(1, 2, 3));
        assert_eq!(a, a2);
    }

    #[test]
    fn default_path_is_one_way_forward() {
        let p = Path::new("A--B", "A", "B", 500);
        assert!(p.is_traversable_forward());
        assert!(!p.is_traversable_reverse());
    }

    #[test]
    fn zero_length_is_clamped() {
        let p = Path::new("A--B", "A", "B", 0);
        assert_eq!(p.length, 1);
    }

    #[test]
    fn routing_group_defaults_to_empty() {
        let v = Vehicle::new("agv-01");
        assert_eq!(v.routing_group(), "");
        let v = Vehicle::new("agv-02").with_property(ROUTING_GROUP_KEY, "heavy");
        assert_eq!(v.routing_group(), "heavy");
    }
}

#[cfg(test)]
mod plant {
    use crate::{
        Block, CoreError, Link, Location, LocationType, Path, PlantModelBuilder, Point,
        ResourceRef,
    };

    #[test]
    fn lookup_present_and_absent() {
        let model = super::helpers::small_model();
        assert!(model.point("A").is_some());
        assert!(model.point("Z").is_none());
        assert!(model.path("A--B").is_some());
        assert!(model.require_point("Z").is_err());
    }

    #[test]
    fn duplicate_resource_names_rejected() {
        let mut b = PlantModelBuilder::new();
        b.add_point(Point::new("A"))
            .add_point(Point::new("B"))
            .add_path(Path::new("A", "A", "B", 100)); // path named like a point
        assert!(matches!(b.build(), Err(CoreError::DuplicateName(_))));
    }

    #[test]
    fn dangling_path_endpoint_rejected() {
        let mut b = PlantModelBuilder::new();
        b.add_point(Point::new("A"))
            .add_path(Path::new("A--B", "A", "B", 100));
        assert!(matches!(b.build(), Err(CoreError::UnknownObject { .. })));
    }

    #[test]
    fn dangling_link_point_rejected() {
        let mut b = PlantModelBuilder::new();
        b.add_point(Point::new("A"))
            .add_location_type(LocationType::new("bin"))
            .add_location(Location::new("L1", "bin").with_link(Link::new("missing")));
        assert!(b.build().is_err());
    }

    #[test]
    fn unknown_block_member_rejected() {
        let mut b = PlantModelBuilder::new();
        b.add_point(Point::new("A"))
            .add_block(Block::new("block1").with_member("nope"));
        assert!(b.build().is_err());
    }

    #[test]
    fn block_expansion_pulls_in_whole_block() {
        let model = super::helpers::small_model();
        let expanded = model.expand_resources(&[ResourceRef::path("A--B")]);
        // A--B is in block1 with point B; point A is not.
        assert!(expanded.contains(&ResourceRef::path("A--B")));
        assert!(expanded.contains(&ResourceRef::point("B")));
        assert_eq!(expanded.len(), 2);
    }

    #[test]
    fn expansion_passes_unblocked_resources_through() {
        let model = super::helpers::small_model();
        let expanded = model.expand_resources(&[ResourceRef::point("A")]);
        assert_eq!(expanded.len(), 1);
        assert!(expanded.contains(&ResourceRef::point("A")));
    }
}
