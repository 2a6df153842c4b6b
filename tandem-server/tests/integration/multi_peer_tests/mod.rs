mod test_move_between_rooms;
mod test_rooms_are_isolated;
mod test_three_peers_join;
